/// Document conversion command.
pub mod convert;
/// Schema inspection command.
pub mod describe;
/// Data table conversion command.
pub mod table;
mod util;
