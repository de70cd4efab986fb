pub mod translate;
pub mod types;

pub use translate::TranslateCommand;
pub use types::TypesCommand;
