pub mod reference_day;
