//! Seeded evaluation order.

use lore_core::{DatasetSize, UserId};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

/// Every user identifier in `size`, shuffled reproducibly from `seed`.
///
/// # Examples
/// ```
/// use lore_core::DatasetSize;
/// use lore_eval::shuffled_users;
///
/// let size = DatasetSize::new(50, 1);
/// assert_eq!(shuffled_users(size, 7), shuffled_users(size, 7));
/// ```
#[must_use]
pub fn shuffled_users(size: DatasetSize, seed: u64) -> Vec<UserId> {
    let mut users: Vec<UserId> = size.user_ids().collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    users.shuffle(&mut rng);
    users
}
