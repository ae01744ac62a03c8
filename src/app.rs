use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::config::{Config, PaperSize};
use crate::menu::{self, Command, MenuState};
use crate::naming::NamingPolicy;
use crate::normalize::FacingPrecision;
use crate::output::Confirm;
use crate::session::{Session, StageOutcome};

/// Reads yes/no answers from the same input as the menu.
struct Prompt<'a, R, W> {
    input: &'a mut R,
    output: &'a mut W,
}

impl<R: BufRead, W: Write> Confirm for Prompt<'_, R, W> {
    fn confirm(&mut self, question: &str) -> bool {
        let _ = write!(self.output, "{} ", question);
        let _ = self.output.flush();
        read_line(&mut *self.input).is_some_and(|answer| answer == "Y" || answer == "y")
    }
}

/// One trimmed line, or `None` at end of input.
fn read_line<R: BufRead>(input: &mut R) -> Option<String> {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

/// Interactive menu driver over a line-based input and output.
pub struct App<R, W> {
    session: Session,
    config_path: PathBuf,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> App<R, W> {
    pub fn new(session: Session, config_path: PathBuf, input: R, output: W) -> Self {
        Self {
            session,
            config_path,
            input,
            output,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> MenuState {
        if self.session.folder().is_none() {
            return MenuState::NoFolder;
        }
        if self.session.log().is_some_and(|log| log.exists()) {
            if self.session.contact_sheet_path().is_some_and(|p| p.is_file()) {
                return MenuState::ContactSheetPresent;
            }
            return MenuState::LogPresent;
        }
        MenuState::FolderLoaded
    }

    /// Load `folder` before the first menu is shown.
    pub fn preload(&mut self, folder: &str) -> Result<()> {
        self.load_folder(folder)
    }

    pub fn run(&mut self) -> Result<()> {
        loop {
            let state = self.state();
            if let Some(folder) = self.session.folder() {
                writeln!(self.output, "\nPhotos folder: {}", folder.display())?;
            }
            write!(self.output, "\n{}Choose an option: ", menu::render(state))?;
            self.output.flush()?;

            let Some(choice) = read_line(&mut self.input) else {
                break;
            };
            let Some(command) = Command::parse(&choice, state) else {
                writeln!(self.output, "Invalid choice: {}", choice)?;
                continue;
            };
            tracing::debug!("Menu command {:?}", command);

            if command == Command::Quit {
                break;
            }
            if let Err(e) = self.dispatch(command) {
                tracing::error!("{:?} failed: {:#}", command, e);
                writeln!(self.output, "Error: {:#}", e)?;
            }
        }

        writeln!(self.output, "Goodbye.")?;
        Ok(())
    }

    fn dispatch(&mut self, command: Command) -> Result<()> {
        let mut prompt = Prompt {
            input: &mut self.input,
            output: &mut self.output,
        };

        let outcome = match command {
            Command::LoadFolder => {
                writeln!(prompt.output, "Enter the path to the photos folder:")?;
                let input = read_line(&mut *prompt.input).unwrap_or_default();
                return self.load_folder(&input);
            }
            Command::EditConfig => return self.edit_config(),
            Command::ViewLog => {
                let log = self.session.log().context("No photos folder is loaded")?;
                return self.view(log.path());
            }
            Command::ViewContactSheet => {
                let path = self
                    .session
                    .contact_sheet_path()
                    .context("No photos folder is loaded")?;
                return self.view(&path);
            }
            Command::CreateLog => self.session.build_log(&mut prompt)?,
            Command::RenamePhotos => self.session.rename_photos(&mut prompt)?,
            Command::AnnotatePhotos => self.session.annotate_photos(&mut prompt)?,
            Command::CreateContactSheet => self.session.build_contact_sheet(&mut prompt)?,
            Command::UpdateOriginals => self.session.update_originals(&mut prompt)?,
            Command::Quit => return Ok(()),
        };

        match outcome {
            StageOutcome::Completed(report) => {
                writeln!(self.output, "{}: done. {}", command.label(), report)?
            }
            StageOutcome::Declined => writeln!(self.output, "Nothing was changed.")?,
        }
        Ok(())
    }

    fn load_folder(&mut self, input: &str) -> Result<()> {
        match self.session.load_folder(input) {
            Ok(report) => {
                writeln!(self.output, "{}", report)?;
            }
            Err(e) => {
                tracing::warn!("Folder not loaded: {}", e);
                writeln!(self.output, "Error: {}", e)?;
            }
        }
        Ok(())
    }

    fn view(&mut self, path: &Path) -> Result<()> {
        open_external(path, self.session.config().viewer.external_viewer.as_deref())?;
        writeln!(self.output, "Opened: {}", path.display())?;
        Ok(())
    }

    /// Ask for each per-project default; a blank answer keeps the current value.
    fn edit_config(&mut self) -> Result<()> {
        let mut config = self.session.config().clone();

        if let Some(value) = self.ask("Photographer", &config.defaults.photographer)? {
            config.defaults.photographer = value;
        }
        if let Some(value) = self.ask("Project", &config.defaults.project)? {
            config.defaults.project = value;
        }
        if let Some(value) = self.ask("Site", &config.defaults.site)? {
            config.defaults.site = value;
        }
        if let Some(value) = self.ask("Subject delimiter", &config.defaults.subject_delimiter)? {
            config.defaults.subject_delimiter = value;
        }
        if let Some(value) = self.ask("Paper size (A4/Letter)", config.defaults.paper_size.name())? {
            match PaperSize::parse(&value) {
                Some(paper) => config.defaults.paper_size = paper,
                None => writeln!(self.output, "Unknown paper size {:?}, kept.", value)?,
            }
        }
        if let Some(value) =
            self.ask("Facing precision (coarse/fine/precise)", config.facing.precision.name())?
        {
            match FacingPrecision::parse(&value) {
                Some(precision) => config.facing.precision = precision,
                None => writeln!(self.output, "Unknown precision {:?}, kept.", value)?,
            }
        }
        if let Some(value) = self.ask(
            "Naming (1 = Subject -- Photographer, 2 = Site_Subject_Sequence)",
            config.naming.format.code(),
        )? {
            match NamingPolicy::parse(&value) {
                Some(format) => config.naming.format = format,
                None => writeln!(self.output, "Unknown naming format {:?}, kept.", value)?,
            }
        }

        config.save_to(&self.config_path)?;
        tracing::info!("Saved config to {:?}", self.config_path);
        writeln!(self.output, "Saved {}", self.config_path.display())?;
        self.session.set_config(config);
        Ok(())
    }

    fn ask(&mut self, field: &str, current: &str) -> Result<Option<String>> {
        write!(self.output, "{} [{}]: ", field, current)?;
        self.output.flush()?;
        Ok(read_line(&mut self.input).filter(|v| !v.is_empty()))
    }
}

/// Open `path` with `viewer`, or the platform default when none is set.
pub fn open_external(path: &Path, viewer: Option<&str>) -> Result<()> {
    if let Some(viewer) = viewer {
        std::process::Command::new(viewer)
            .arg(path)
            .spawn()
            .with_context(|| format!("Failed to start {}", viewer))?;
        return Ok(());
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(path).spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", &path.to_string_lossy()])
            .spawn()?;
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        std::process::Command::new("xdg-open").arg(path).spawn()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::fake::FakeSource;
    use crate::metadata::{RawMetadata, Tag};
    use image::RgbImage;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn app(input: &str, config_path: PathBuf) -> App<Cursor<Vec<u8>>, Vec<u8>> {
        let mut source = FakeSource::default();
        source.photos.insert(
            "a.jpg".into(),
            RawMetadata::new().with(Tag::ImageDescription, "Gate: open"),
        );
        let session = Session::new(Config::default(), Box::new(source));
        App::new(
            session,
            config_path,
            Cursor::new(input.as_bytes().to_vec()),
            Vec::new(),
        )
    }

    fn printed<R>(app: &App<R, Vec<u8>>) -> String {
        String::from_utf8_lossy(&app.output).to_string()
    }

    #[test]
    fn test_hidden_commands_are_rejected() {
        let dir = tempdir().unwrap();
        let mut app = app("4\nq\n", dir.path().join("config.toml"));

        app.run().unwrap();

        let out = printed(&app);
        assert!(out.contains("Invalid choice: 4"));
        assert!(out.ends_with("Goodbye.\n"));
    }

    #[test]
    fn test_load_then_create_log() {
        let dir = tempdir().unwrap();
        RgbImage::new(4, 4).save(dir.path().join("a.jpg")).unwrap();
        let input = format!("1\n{}\n2\nq\n", dir.path().display());
        let mut app = app(&input, dir.path().join("config.toml"));

        app.run().unwrap();

        assert_eq!(app.state(), MenuState::LogPresent);
        let records = app.session().log().unwrap().load().unwrap();
        assert_eq!(records[0].subject, "Gate");
        assert!(printed(&app).contains("Create the photo log: done."));
    }

    #[test]
    fn test_overwrite_needs_capital_or_lower_y() {
        let dir = tempdir().unwrap();
        RgbImage::new(4, 4).save(dir.path().join("a.jpg")).unwrap();
        let input = format!("1\n{}\n2\n2\nyes\nq\n", dir.path().display());
        let mut app = app(&input, dir.path().join("config.toml"));

        app.run().unwrap();

        assert!(printed(&app).contains("Nothing was changed."));
    }

    #[test]
    fn test_missing_folder_keeps_no_folder_state() {
        let dir = tempdir().unwrap();
        let mut app = app("1\n/nonexistent/photos\n", dir.path().join("config.toml"));

        app.run().unwrap();

        assert_eq!(app.state(), MenuState::NoFolder);
        assert!(printed(&app).contains("does not exist"));
    }

    #[test]
    fn test_edit_config_saves_and_applies() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        let mut app = app("e\nJ. Doe\n\nNorth Ridge\n\nletter\nfine\n2\nq\n", config_path.clone());

        app.run().unwrap();

        let saved = Config::load_from(&config_path).unwrap();
        assert_eq!(saved.defaults.photographer, "J. Doe");
        assert_eq!(saved.defaults.project, "");
        assert_eq!(saved.defaults.site, "North Ridge");
        assert_eq!(saved.defaults.subject_delimiter, ":");
        assert_eq!(saved.defaults.paper_size, PaperSize::Letter);
        assert_eq!(saved.facing.precision, FacingPrecision::Fine);
        assert_eq!(saved.naming.format, NamingPolicy::BySiteSequence);
        assert_eq!(app.session().config(), &saved);
    }
}
