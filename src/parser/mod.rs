pub mod lexer;
pub mod line_index;
pub mod span;
pub mod stream;

pub use span::Loc;
pub use stream::{TokenSource, TokenStream};
