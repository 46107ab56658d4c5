//! Shared test harness modules for the LORE CLI.

use super::*;

mod helpers;
