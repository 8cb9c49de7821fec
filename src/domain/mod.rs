pub mod computing_status;
pub mod utils;
