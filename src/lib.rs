pub use controller::*;
pub use mailbox::*;
pub use safety::*;
pub use sim::*;
pub use supervisor::*;
