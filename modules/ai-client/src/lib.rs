pub mod error;
pub mod openai;
pub mod traits;
pub mod util;

pub use error::{AiError, Result};
pub use openai::{OpenAi, OpenAiOutputBuilder, OpenAiPromptBuilder, StructuredOutput};
pub use traits::{Agent, OutputBuilder, PromptBuilder};
pub use util::{strip_code_blocks, truncate_to_char_boundary};
