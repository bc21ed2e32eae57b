mod count_down_latch;
mod low_level_lock;
mod sequence_allocator;

pub use self::{count_down_latch::*, low_level_lock::*, sequence_allocator::*};
