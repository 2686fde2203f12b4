use plume_spellcheck::CheckError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("nothing to send")]
    EmptyInput,
    #[error("a message is already waiting for the spell-check")]
    Busy,
    #[error("no message is waiting for the spell-check")]
    NothingPending,
    #[error("presets are only available when the panel is unlocked")]
    PanelLocked,
    #[error(transparent)]
    Check(#[from] CheckError),
}
