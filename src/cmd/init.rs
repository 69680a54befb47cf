//! `note-dispatch init`: write a starter input file.

use std::path::Path;

use crate::cli::InitArgs;
use crate::error::NoteDispatchError;

pub const TEMPLATE: &str = "\
ExternalMemberID,VisibleID,NoteText
EXT-0001,GENERAL_NOTE,\"Called member, left voicemail\"
";

pub fn execute(args: &InitArgs) -> Result<(), NoteDispatchError> {
    write_template(&args.output, args.force)?;
    println!("Created {}", args.output.display());
    Ok(())
}

pub fn write_template(output: &Path, force: bool) -> Result<(), NoteDispatchError> {
    if output.exists() && !force {
        return Err(NoteDispatchError::FileExists {
            path: output.to_path_buf(),
        });
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, TEMPLATE)?;
    Ok(())
}
