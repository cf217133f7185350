/*!
 * This is the engine provider module.
 * Adding new ways of reaching the meshing engine should be done here.
 *
 * New providers need:
 * - A struct implementing `EngineProvider`
 * - An enum variant containing that struct in `EngineChoice`
 * - A constructor arg_name and function in `ENGINE_CONSTRUCTION`
 *
 */

use std::path::Path;

use enum_dispatch::enum_dispatch;

use crate::{
    engine,
    args,
    io,
};

//
// ------------------------------------------------------------
// Code that requires modification to add a new engine provider
//      |
//      V
//

// Source files for the engine providers
pub mod bridge;
pub mod simulated;

/// Engine providers enum.
/// To add a new provider:
/// include it here,
/// add handling for its constructor in `ENGINE_CONSTRUCTION`,
/// and implement the `EngineProvider` trait for it.
#[derive(Debug)]
#[enum_dispatch(EngineProvider)]
pub enum EngineChoice {
    /// Engine reached through a bridge process speaking JSON lines.
    Bridge(bridge::Method),
    /// Scripted in-process engine for dry runs.
    Simulated(simulated::Method),
}

/// Engine construction array -- Written out in once place for easy modification.
/// To add a new provider:
/// include it in the `EngineChoice` enum,
/// add handling for its constructor here,
/// and implement the `EngineProvider` trait for it.
const ENGINE_CONSTRUCTION: &[EngineConstructor] = &[
    // Bridge process constructor.
    EngineConstructor{
        arg_name: "bridge",
        constructor: || {Ok(EngineChoice::Bridge(bridge::Method::new()?))},
    },
    // Simulated engine constructor.
    EngineConstructor{
        arg_name: "simulated",
        constructor: || {Ok(EngineChoice::Simulated(simulated::Method::new()?))},
    },
];

//
// ------------------------------------------------------------
// Traits and structs that don't need modification,
// but are references for adding a new engine provider
//      |
//      V
//

/// Engine provider trait.
/// This trait must be implemented for all engine providers.
/// To add a new provider:
/// include it in the `EngineChoice` enum,
/// add handling for its constructor in `ENGINE_CONSTRUCTION`,
/// and implement this trait for it.
#[enum_dispatch] // This is a macro that allows the enum to be used in a trait object-like way
pub trait EngineProvider {
    /// Get the name of the engine provider.
    fn get_method_name(&self) -> String;

    /// Parse the provider config file.
    fn parse_method_cfg(&mut self, method_cfg_file: &Path) -> args::ProcResult<()>;

    /// Render the provider config in the format named by `extension`.
    fn describe_method_cfg(&self, extension: &str) -> io::IoResult<String>;

    /// Start the engine and connect to it.
    /// Returns the live session or an `EngineError::Launch`/`EngineError::Unsupported`.
    fn launch(&self, launch_cfg: &engine::LaunchConfig) -> engine::ProcResult<Box<dyn engine::EngineSession>>;
}

/// Engine provider constructor.
/// Used to construct an engine provider from a config file.
struct EngineConstructor {
    /// Name of the engine provider.
    arg_name: &'static str,
    /// Constructor function.
    constructor: fn() -> args::ProcResult<EngineChoice>,
}

//
// ------------------------------------------------------------
// Functions and structs with no modification or reference needed
//      |
//      V
//

/// Engine provider construction
impl EngineChoice {
    /// Construct an engine provider from a name (given in the config file).
    pub fn from_name(arg_name: &str) -> args::ProcResult<Self> {
        for constructor in ENGINE_CONSTRUCTION {
            if constructor.arg_name == arg_name {
                return (constructor.constructor)();
            }
        }

        let mut error_str = format!("Engine method not found: {arg_name}\n");
        error_str.push_str("Available methods:\n");
        for constructor in ENGINE_CONSTRUCTION {
            error_str.push_str(&format!("    {}\n", constructor.arg_name));
        }
        args::err_str(&error_str)
    }

    /// Names accepted by `from_name`.
    pub fn method_names() -> Vec<&'static str> {
        ENGINE_CONSTRUCTION.iter().map(|constructor| constructor.arg_name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructs_every_listed_method() {
        for name in EngineChoice::method_names() {
            let choice = EngineChoice::from_name(name).unwrap();
            assert_eq!(choice.get_method_name(), name);
        }
    }

    #[test]
    fn unknown_method_lists_alternatives() {
        let err = EngineChoice::from_name("grpc").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("grpc"));
        assert!(msg.contains("bridge"));
        assert!(msg.contains("simulated"));
    }
}
