use std::process::ExitCode;

use meshdriver::args::DriverCommand;
use meshdriver::checkpoint::{
    AutoConfirm,
    Checkpoint,
    Interrupt,
    Interruptible,
    PromptCheckpoint,
};

fn main() -> ExitCode {

    // 1. Parse commandline arguments, no command means a default run
    let cli = meshdriver::args::parse_cli_args();
    let run_args = match cli.sub_command {
        Some(DriverCommand::Example(example_args)) => {
            return match meshdriver::example_config(&example_args) {
                Ok(text) => {
                    println!("{}", text);
                    ExitCode::SUCCESS
                },
                Err(err) => {
                    eprintln!("{}", err);
                    ExitCode::FAILURE
                },
            };
        },
        Some(DriverCommand::Run(run_args)) => run_args,
        None => Default::default(),
    };

    // 2. Load the config and build the engine provider
    let target = match meshdriver::build_target(&run_args) {
        Ok(target) => target,
        Err(err) => {
            eprintln!("CONFIG ERROR!");
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        },
    };
    meshdriver::logging::init_logging(&target.cfg.log_level);

    // 3. Run the pipeline, Ctrl-C stops it at the next step boundary
    let operator: Box<dyn Checkpoint> = if target.cfg.auto_confirm {
        Box::new(AutoConfirm)
    }
    else {
        Box::new(PromptCheckpoint::stdin())
    };
    let interrupt = Interrupt::on_ctrl_c().unwrap_or_else(|err| {
        tracing::warn!("Ctrl-C will end the process without closing the engine:\n{}", err);
        Interrupt::new()
    });
    let mut checkpoint = Interruptible::new(operator, interrupt);
    if let Err(err) = meshdriver::run_process(&target.cfg, &target.provider, &mut checkpoint) {
        tracing::error!("PROCESS ERROR!\n{}", err);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
