pub const GROUP_CREATED: &str = "GROUP_CREATED";
pub const GROUP_RENAMED: &str = "GROUP_RENAMED";
pub const GROUP_DELETED: &str = "GROUP_DELETED";
pub const GROUP_JOINED: &str = "GROUP_JOINED";
pub const PARTICIPANT_ADDED: &str = "PARTICIPANT_ADDED";
pub const PARTICIPANT_DELETED: &str = "PARTICIPANT_DELETED";
pub const GIFT_ADDED: &str = "GIFT_ADDED";
pub const GIFT_UPDATED: &str = "GIFT_UPDATED";
pub const GIFT_DELETED: &str = "GIFT_DELETED";

pub const DEFAULT_MAX_BUDGET: f64 = 15.0;
pub const DEFAULT_INVITE_CODE_ATTEMPTS: usize = 5;
pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_URL_LENGTH: usize = 2048;
pub const MAX_PRICE: f64 = 1_000_000.0;
