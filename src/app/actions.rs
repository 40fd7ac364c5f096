#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    Resize,

    ListUp,
    ListDown,
    GoTop,
    GoBottom,
    PageUp,
    PageDown,

    /// Open or close the detail of the selected song
    ToggleExpand,
    PlaySelected,
    TogglePause,
    Stop,
    VolumeUp,
    VolumeDown,

    // Query toolbar
    NextLanguage,
    LikesUp,
    LikesDown,
    RandomSeed,
    EditSeed,
    InputChar(char),
    Backspace,
    CommitSeed,
    CancelSeed,
    Retry,

    ToggleHelp,
}
