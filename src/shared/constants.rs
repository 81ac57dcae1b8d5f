/// Default number of prompts returned per list page
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Default list offset
pub const DEFAULT_SKIP: i64 = 0;
