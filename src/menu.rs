//! Menu commands and which of them the current session state allows.

/// How far the user has got with the loaded folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MenuState {
    NoFolder,
    FolderLoaded,
    LogPresent,
    ContactSheetPresent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    LoadFolder,
    CreateLog,
    ViewLog,
    RenamePhotos,
    AnnotatePhotos,
    CreateContactSheet,
    ViewContactSheet,
    UpdateOriginals,
    EditConfig,
    Quit,
}

impl Command {
    pub const ALL: [Command; 10] = [
        Command::LoadFolder,
        Command::CreateLog,
        Command::ViewLog,
        Command::RenamePhotos,
        Command::AnnotatePhotos,
        Command::CreateContactSheet,
        Command::ViewContactSheet,
        Command::UpdateOriginals,
        Command::EditConfig,
        Command::Quit,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Command::LoadFolder => "1",
            Command::CreateLog => "2",
            Command::ViewLog => "3",
            Command::RenamePhotos => "4",
            Command::AnnotatePhotos => "5",
            Command::CreateContactSheet => "6",
            Command::ViewContactSheet => "7",
            Command::UpdateOriginals => "8",
            Command::EditConfig => "E",
            Command::Quit => "Q",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Command::LoadFolder => "Load a photos folder",
            Command::CreateLog => "Create the photo log",
            Command::ViewLog => "View/edit the photo log",
            Command::RenamePhotos => "Rename photos",
            Command::AnnotatePhotos => "Annotate photos",
            Command::CreateContactSheet => "Create a contact sheet",
            Command::ViewContactSheet => "View the contact sheet",
            Command::UpdateOriginals => "Update metadata of the original photos",
            Command::EditConfig => "Edit defaults",
            Command::Quit => "Quit",
        }
    }

    /// Least advanced state in which the command is offered.
    fn requires(&self) -> MenuState {
        match self {
            Command::LoadFolder | Command::EditConfig | Command::Quit => MenuState::NoFolder,
            Command::CreateLog => MenuState::FolderLoaded,
            Command::ViewLog
            | Command::RenamePhotos
            | Command::AnnotatePhotos
            | Command::CreateContactSheet
            | Command::UpdateOriginals => MenuState::LogPresent,
            Command::ViewContactSheet => MenuState::ContactSheetPresent,
        }
    }

    pub fn is_available(&self, state: MenuState) -> bool {
        state >= self.requires()
    }

    /// Match user input against the commands offered in `state`.
    pub fn parse(input: &str, state: MenuState) -> Option<Command> {
        let input = input.trim();
        available(state)
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(input))
    }
}

pub fn available(state: MenuState) -> Vec<Command> {
    Command::ALL
        .into_iter()
        .filter(|c| c.is_available(state))
        .collect()
}

/// Menu text for `state`, one command per line.
pub fn render(state: MenuState) -> String {
    available(state)
        .iter()
        .map(|c| format!("  {}  {}\n", c.key(), c.label()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(state: MenuState) -> Vec<&'static str> {
        available(state).iter().map(|c| c.key()).collect()
    }

    #[test]
    fn test_available_by_state() {
        assert_eq!(keys(MenuState::NoFolder), vec!["1", "E", "Q"]);
        assert_eq!(keys(MenuState::FolderLoaded), vec!["1", "2", "E", "Q"]);
        assert_eq!(
            keys(MenuState::LogPresent),
            vec!["1", "2", "3", "4", "5", "6", "8", "E", "Q"]
        );
        assert_eq!(
            keys(MenuState::ContactSheetPresent),
            vec!["1", "2", "3", "4", "5", "6", "7", "8", "E", "Q"]
        );
    }

    #[test]
    fn test_parse_rejects_hidden_commands() {
        assert_eq!(Command::parse("2", MenuState::NoFolder), None);
        assert_eq!(
            Command::parse(" 2 ", MenuState::FolderLoaded),
            Some(Command::CreateLog)
        );
        assert_eq!(Command::parse("q", MenuState::NoFolder), Some(Command::Quit));
        assert_eq!(
            Command::parse("e", MenuState::LogPresent),
            Some(Command::EditConfig)
        );
        assert_eq!(Command::parse("9", MenuState::ContactSheetPresent), None);
    }

    #[test]
    fn test_render() {
        let menu = render(MenuState::NoFolder);
        assert!(menu.contains("1  Load a photos folder"));
        assert!(!menu.contains("Rename"));
    }
}
