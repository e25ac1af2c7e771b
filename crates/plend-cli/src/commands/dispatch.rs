use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Describe(args) => commands::describe::handle(&args, ctx, flags),
        Commands::Composites => commands::composites::handle(ctx, flags),
        Commands::Regress(args) => commands::regress::handle(&args, ctx, flags),
        Commands::Correlate(args) => commands::correlate::handle(&args, ctx, flags),
        Commands::Compare(args) => commands::compare::handle(&args, ctx, flags),
        Commands::Factor(args) => commands::factor::handle(&args, ctx, flags),
        Commands::Mediate(args) => commands::mediate::handle(&args, ctx, flags),
        Commands::Plot { kind } => commands::plot::handle(&kind, ctx, flags),
        Commands::Run(args) => commands::run::handle(&args, ctx, flags),
        Commands::Schema(args) => commands::schema::handle(&args, flags),
    }
}
