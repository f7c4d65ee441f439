pub mod attendance;
pub mod year_month;
