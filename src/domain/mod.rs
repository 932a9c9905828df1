pub mod category;
pub mod knowledge;
pub mod result;

pub use category::{Category, UnknownCategory};
pub use knowledge::{KnowledgeBase, KnowledgeRecord};
pub use result::{ClassificationResult, FinalResult};
