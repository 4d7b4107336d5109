//! The batch (non-debug) runner: lex, parse, and execute a file directly
//! with no line hook installed, translating errors into spec.md §6's
//! process exit codes and §7's one-line rendering on stderr.
//! (SPEC_FULL.md's "Batch runner" supplemented feature, grounded in
//! `Run.py`'s no-debugger code path.)

use std::path::Path;
use std::sync::Arc;

use tracing::info;
use tutel_interp::{GuiMock, Interpreter};
use tutel_par::Parser;

use crate::error::{Result, TutelCliError};

pub struct RunArgs {
    pub file: std::path::PathBuf,
    pub entry: String,
}

/// Runs `args.file` to completion and returns `Ok(())` on success. Every
/// failure path (missing file, lex error, parse error, runtime error) is
/// reported through [`TutelCliError`], whose `exit_code` the caller maps
/// to the process exit code.
pub fn run(args: RunArgs) -> Result<()> {
    let source = read_source(&args.file)?;
    info!(file = %args.file.display(), entry = %args.entry, "running");

    let program = Parser::new(&source)?.parse()?;

    let mut interpreter = Interpreter::new(Arc::new(GuiMock));
    interpreter.execute(program, Some(args.entry.as_str()))?;
    Ok(())
}

fn read_source(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(TutelCliError::FileNotFound(path.display().to_string()));
    }
    Ok(std::fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_source(source: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(source.as_bytes()).unwrap();
        file
    }

    #[test]
    fn runs_a_simple_program_to_completion() {
        let file = write_source("main(){a = 1;}");
        let result = run(RunArgs { file: file.path().to_path_buf(), entry: "main".to_string() });
        assert!(result.is_ok());
    }

    #[test]
    fn missing_file_maps_to_file_not_found() {
        let result = run(RunArgs { file: "/nonexistent/does-not-exist.tutel".into(), entry: "main".to_string() });
        assert_eq!(result.unwrap_err().exit_code(), -1);
    }

    #[test]
    fn lexical_error_maps_to_minus_two() {
        let file = write_source("main(){a = \"unterminated;}");
        let result = run(RunArgs { file: file.path().to_path_buf(), entry: "main".to_string() });
        assert_eq!(result.unwrap_err().exit_code(), -2);
    }

    #[test]
    fn parse_error_maps_to_minus_three() {
        let file = write_source("main(){a = ;}");
        let result = run(RunArgs { file: file.path().to_path_buf(), entry: "main".to_string() });
        assert_eq!(result.unwrap_err().exit_code(), -3);
    }

    #[test]
    fn runtime_error_maps_to_minus_four() {
        let file = write_source("main(){foo();}");
        let result = run(RunArgs { file: file.path().to_path_buf(), entry: "main".to_string() });
        assert_eq!(result.unwrap_err().exit_code(), -4);
    }
}
