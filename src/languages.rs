//! Dispatch table for the closed set of supported languages.
//!
//! Unlike a plugin registry, this table cannot grow without a code change:
//! the language set is fixed at {Python, C++, C}.

use crate::core::Language;

/// What the Compiler Driver does for one language.
pub struct LanguageSpec {
    /// Source file name written into the workspace, e.g. `main.cpp`.
    pub source_file: &'static str,
    /// Compile command, run with the workspace as `cwd`. `None` for
    /// interpreted languages.
    pub compile_command: Option<&'static [&'static str]>,
    /// Command used to run the compiled or interpreted program, with
    /// `{exe}` replaced by the workspace-relative executable path.
    pub run_command: &'static [&'static str],
}

const EXE_PLACEHOLDER: &str = "{exe}";

impl LanguageSpec {
    pub fn for_language(language: Language) -> Self {
        match language {
            Language::Python => LanguageSpec {
                source_file: "main.py",
                compile_command: None,
                run_command: &["python3", "main.py"],
            },
            Language::Cpp => LanguageSpec {
                source_file: "main.cpp",
                compile_command: Some(&["g++", "-O2", "main.cpp", "-o", EXE_PLACEHOLDER]),
                run_command: &[EXE_PLACEHOLDER],
            },
            Language::C => LanguageSpec {
                source_file: "main.c",
                compile_command: Some(&["gcc", "-O2", "main.c", "-o", EXE_PLACEHOLDER]),
                run_command: &[EXE_PLACEHOLDER],
            },
        }
    }

    /// Build the compile command with `{exe}` substituted, or `None` for
    /// interpreted languages.
    pub fn compile_argv(&self, exe_path: &str) -> Option<Vec<String>> {
        self.compile_command
            .map(|cmd| cmd.iter().map(|a| substitute(a, exe_path)).collect())
    }

    /// Build the run command with `{exe}` substituted.
    pub fn run_argv(&self, exe_path: &str) -> Vec<String> {
        self.run_command.iter().map(|a| substitute(a, exe_path)).collect()
    }
}

fn substitute(arg: &str, exe_path: &str) -> String {
    if arg == EXE_PLACEHOLDER {
        exe_path.to_string()
    } else {
        arg.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_has_no_compile_step() {
        let spec = LanguageSpec::for_language(Language::Python);
        assert!(spec.compile_argv("exe").is_none());
        assert_eq!(spec.run_argv("exe"), vec!["python3", "main.py"]);
    }

    #[test]
    fn cpp_compiles_with_o2_and_runs_the_binary() {
        let spec = LanguageSpec::for_language(Language::Cpp);
        let compile = spec.compile_argv("/ws/a/exe").unwrap();
        assert_eq!(compile, vec!["g++", "-O2", "main.cpp", "-o", "/ws/a/exe"]);
        assert_eq!(spec.run_argv("/ws/a/exe"), vec!["/ws/a/exe"]);
    }

    #[test]
    fn c_uses_gcc() {
        let spec = LanguageSpec::for_language(Language::C);
        let compile = spec.compile_argv("/ws/a/exe").unwrap();
        assert_eq!(compile[0], "gcc");
    }
}
