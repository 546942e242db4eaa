//! Writing tests - value writes and style merges, checked after a save.

mod formats;
mod values;
