use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Keeps a directory of requirement documents numbered, validated and registered"
)]
pub struct Cli {
    /// Path to a YAML config file (overrides REQREG_CONFIG and reqreg.yaml)
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[clap(long, short = 'v', global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

/// Steps of the full pipeline that can be switched off
#[derive(Args, Debug, Clone, Default)]
pub struct StepFlags {
    /// Skip the gap-filling renumber step
    #[clap(long)]
    pub skip_renumber: bool,

    /// Skip template validation
    #[clap(long)]
    pub skip_validate: bool,

    /// Abort the pipeline if any document fails template validation
    #[clap(long)]
    pub strict_validate: bool,

    /// Skip MoSCoW priority assignment
    #[clap(long)]
    pub skip_priority: bool,

    /// Skip the README register rebuild
    #[clap(long)]
    pub skip_register: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run renumber, validate, priority and register in order
    Run {
        /// Single project directory; projects under --req-root are
        /// discovered when omitted
        #[clap(long)]
        req_dir: Option<PathBuf>,

        /// README register to update (defaults to the one inside the project)
        #[clap(long)]
        readme: Option<PathBuf>,

        /// Root scanned for project directories (defaults to the config value)
        #[clap(long)]
        req_root: Option<PathBuf>,

        /// Print results without writing any files
        #[clap(long)]
        dry_run: bool,

        #[clap(flatten)]
        steps: StepFlags,
    },

    /// Close identifier gaps and normalise padding
    Renumber {
        /// Directory containing the requirement documents
        #[clap(long, default_value = ".")]
        req_dir: PathBuf,

        /// Print the planned relabeling without modifying files
        #[clap(long)]
        dry_run: bool,
    },

    /// Check documents against the requirement template
    Validate {
        /// Directory containing the requirement documents
        #[clap(long, default_value = ".")]
        req_dir: PathBuf,

        /// Exit with an error if any document fails
        #[clap(long)]
        strict: bool,
    },

    /// Derive MoSCoW priorities from the CS / CD scores
    Priority {
        /// Directory containing the requirement documents
        #[clap(long, default_value = ".")]
        req_dir: PathBuf,

        /// README whose Priority column should be refreshed (defaults to the
        /// one inside the directory)
        #[clap(long)]
        readme: Option<PathBuf>,

        /// Print priorities without modifying files
        #[clap(long)]
        dry_run: bool,
    },

    /// Rebuild the README metrics and requirements table
    Register {
        /// Directory containing the requirement documents
        #[clap(long, default_value = ".")]
        req_dir: PathBuf,

        /// README register to update
        #[clap(long)]
        readme: Option<PathBuf>,

        /// Print the generated register without writing it
        #[clap(long)]
        dry_run: bool,
    },

    /// Export parsed requirements and metrics as JSON
    Export {
        /// Directory containing the requirement documents
        #[clap(long, default_value = ".")]
        req_dir: PathBuf,

        /// Output file (prints to stdout when omitted)
        #[clap(long, short = 'o')]
        output: Option<PathBuf>,
    },
}
