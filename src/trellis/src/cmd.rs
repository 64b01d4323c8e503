pub mod bin;
pub mod render;
pub mod xml;

/// Represents a command in the Trellis application.
pub trait Command {
    /// Consumes a command object and executes the handler actions
    /// associated with it.
    ///
    /// On failure, an error will be reported.
    fn handle(self) -> eyre::Result<()>;
}
