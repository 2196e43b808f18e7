use std::path::PathBuf;

use validator::Validate;

use crate::error::DeployResult;

/// Options passed to the cluster when running a jar
///
/// Each option is sent only when present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct DeployParams {
    /// Program arguments as `key=value` strings
    pub program_args: Vec<String>,

    /// Savepoint the new job resumes from
    pub savepoint_path: Option<String>,

    /// Fully qualified main class, when the jar manifest does not name one
    pub entry_class: Option<String>,

    #[validate(range(min = 1, message = "Parallelism must be at least 1"))]
    pub parallelism: Option<u32>,
}

impl DeployParams {
    /// Render program arguments for the cluster.
    ///
    /// Each `key=value` becomes `--key value`; every `=` splits, so
    /// `a=b=c` becomes `--a b c`.
    pub fn program_args(&self) -> Option<String> {
        if self.program_args.is_empty() {
            return None;
        }

        let rendered: Vec<String> = self
            .program_args
            .iter()
            .map(|arg| format!("--{}", arg.split('=').collect::<Vec<_>>().join(" ")))
            .collect();
        Some(rendered.join(" "))
    }

    /// Query parameters for the run request, in a fixed order.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(args) = self.program_args() {
            query.push(("program-args", args));
        }
        if let Some(path) = &self.savepoint_path {
            query.push(("savepointPath", path.clone()));
        }
        if let Some(class) = &self.entry_class {
            query.push(("entry-class", class.clone()));
        }
        if let Some(parallelism) = self.parallelism {
            query.push(("parallelism", parallelism.to_string()));
        }
        query
    }
}

/// A request to (re)deploy a named job from a local jar
#[derive(Debug, Clone, Validate)]
pub struct DeployRequest {
    #[validate(length(min = 1, message = "Job name must not be empty"))]
    pub name: String,

    pub jar_file: PathBuf,

    #[validate(nested)]
    pub params: DeployParams,
}

impl DeployRequest {
    pub fn new(name: impl Into<String>, jar_file: impl Into<PathBuf>, params: DeployParams) -> Self {
        Self {
            name: name.into(),
            jar_file: jar_file.into(),
            params,
        }
    }

    /// Validate the request before anything is sent to the cluster.
    pub fn check(&self) -> DeployResult<()> {
        self.validate()?;
        Ok(())
    }

    /// True when the caller supplied the savepoint to resume from.
    pub fn has_explicit_savepoint(&self) -> bool {
        self.params.savepoint_path.is_some()
    }
}
