mod proc_errors;

use tracing::{info, warn};

use crate::engine::{
    EngineError,
    EngineProvider,
    EngineSession,
    LaunchConfig,
};

// Re-export errors
pub use proc_errors::{
    SessionError,
    ProcResult,
};

/// Owner of the engine session.
/// Releases the session exactly once: through `release`, or on drop when
/// the pipeline bails out early (error return, panic, operator abort).
#[derive(Debug)]
pub struct SessionGuard {
    session: Option<Box<dyn EngineSession>>,
    method_name: String,
}
impl SessionGuard {
    /// Borrow the live session.
    /// Fails with `SessionError::Released` once the guard has released it.
    pub fn session(&mut self) -> ProcResult<&mut dyn EngineSession> {
        let session: &mut dyn EngineSession = self.session
            .as_deref_mut()
            .ok_or(SessionError::Released)?;
        Ok(session)
    }

    /// True until the session has been released.
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Name of the provider that launched the session.
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// Close the session. Never fails, close errors are only logged.
    pub fn release(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            info!("Closing {} engine session...", self.method_name);
            if let Err(error) = session.exit() {
                warn!("Engine session did not close cleanly:\n{}", error);
            }
        }
    }
}
impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.close();
    }
}

/// Check a launch configuration before anything is started.
pub fn validate_launch(launch_cfg: &LaunchConfig) -> ProcResult<()> {
    if launch_cfg.mode != "meshing" {
        return Err(SessionError::ResourceUnavailable(format!(
            "engine mode \"{}\" cannot run the meshing workflow, use \"meshing\"",
            launch_cfg.mode,
        )));
    }
    if launch_cfg.processor_count == 0 {
        return Err(SessionError::ResourceUnavailable("processor count must be at least 1".to_string()));
    }
    if launch_cfg.start_timeout_s == 0 {
        return Err(SessionError::ResourceUnavailable("start timeout must be at least 1 s".to_string()));
    }
    Ok(())
}

/// Launch the engine and take ownership of the session.
/// Returns `SessionError::ResourceUnavailable` for configurations the
/// engine cannot honor and `SessionError::Launch` for everything else.
pub fn acquire<P>(provider: &P, launch_cfg: &LaunchConfig) -> ProcResult<SessionGuard>
where P: EngineProvider + ?Sized
{
    validate_launch(launch_cfg)?;

    let method_name = provider.get_method_name();
    info!(
        "Launching {} engine ({} mode, {} precision, {} processors, gui: {})...",
        method_name, launch_cfg.mode, launch_cfg.precision, launch_cfg.processor_count, launch_cfg.show_gui,
    );

    match provider.launch(launch_cfg) {
        Ok(session) => Ok(SessionGuard{session: Some(session), method_name}),
        Err(EngineError::Unsupported(message)) => Err(SessionError::ResourceUnavailable(message)),
        Err(source) => Err(SessionError::Launch{method: method_name, source}),
    }
}
