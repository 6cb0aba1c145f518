pub mod companies_house;

pub use companies_house::{CompaniesHouseParser, Parser, SearchPage};
