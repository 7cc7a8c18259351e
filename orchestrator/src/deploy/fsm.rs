//! Linear phase machines for the orchestrators
//!
//! Both operations run a fixed, ordered sequence of phases with no branching
//! beyond early abort: any phase can transition directly to the failure
//! terminal, nothing else deviates from the line. The current phase names
//! the run step recorded when a step aborts.

/// Phases of one deployment run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployPhase {
    Init,
    ValidateInput,
    Connect,
    PrepareDir,
    UploadContent,
    RenderConfig,
    InstallConfig,
    EnableSite,
    TestConfig,
    Reload,
    RecordSuccess,
    RecordFailure,
}

impl DeployPhase {
    /// Step name used in the run log for this phase.
    pub fn step_name(&self) -> &'static str {
        match self {
            DeployPhase::Init => "Init",
            DeployPhase::ValidateInput => "Validate",
            DeployPhase::Connect => "SSH",
            DeployPhase::PrepareDir => "Prepare",
            DeployPhase::UploadContent => "Upload",
            DeployPhase::RenderConfig => "Nginx",
            DeployPhase::InstallConfig => "Nginx",
            DeployPhase::EnableSite => "Enable",
            DeployPhase::TestConfig => "NginxTest",
            DeployPhase::Reload => "Reload",
            DeployPhase::RecordSuccess => "Done",
            DeployPhase::RecordFailure => "Failed",
        }
    }

    fn next(self) -> DeployPhase {
        match self {
            DeployPhase::Init => DeployPhase::ValidateInput,
            DeployPhase::ValidateInput => DeployPhase::Connect,
            DeployPhase::Connect => DeployPhase::PrepareDir,
            DeployPhase::PrepareDir => DeployPhase::UploadContent,
            DeployPhase::UploadContent => DeployPhase::RenderConfig,
            DeployPhase::RenderConfig => DeployPhase::InstallConfig,
            DeployPhase::InstallConfig => DeployPhase::EnableSite,
            DeployPhase::EnableSite => DeployPhase::TestConfig,
            DeployPhase::TestConfig => DeployPhase::Reload,
            DeployPhase::Reload => DeployPhase::RecordSuccess,
            // Terminal phases absorb
            DeployPhase::RecordSuccess => DeployPhase::RecordSuccess,
            DeployPhase::RecordFailure => DeployPhase::RecordFailure,
        }
    }
}

/// Tracks progress through the deployment sequence.
#[derive(Debug, Clone)]
pub struct DeployFsm {
    phase: DeployPhase,
}

impl DeployFsm {
    /// Create a new machine in the initial phase.
    pub fn new() -> Self {
        Self {
            phase: DeployPhase::Init,
        }
    }

    /// Get the current phase.
    pub fn phase(&self) -> DeployPhase {
        self.phase
    }

    /// Advance to the next phase in the fixed order.
    pub fn advance(&mut self) -> DeployPhase {
        self.phase = self.phase.next();
        self.phase
    }

    /// Abort: transition directly to the failure terminal.
    pub fn fail(&mut self) -> DeployPhase {
        self.phase = DeployPhase::RecordFailure;
        self.phase
    }

    /// Whether the machine reached a terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.phase,
            DeployPhase::RecordSuccess | DeployPhase::RecordFailure
        )
    }
}

impl Default for DeployFsm {
    fn default() -> Self {
        Self::new()
    }
}

/// Phases of one TLS provisioning run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsPhase {
    Init,
    ValidateInput,
    MarkPending,
    Connect,
    PreconditionCheck,
    IssueCertificate,
    TestConfig,
    Reload,
    RecordSuccess,
    RecordFailure,
}

impl TlsPhase {
    /// Step name used in the run log for this phase.
    pub fn step_name(&self) -> &'static str {
        match self {
            TlsPhase::Init => "Init",
            TlsPhase::ValidateInput => "Validate",
            TlsPhase::MarkPending => "Claim",
            TlsPhase::Connect => "SSH",
            TlsPhase::PreconditionCheck => "Precondition",
            TlsPhase::IssueCertificate => "Certbot",
            TlsPhase::TestConfig => "NginxTest",
            TlsPhase::Reload => "Reload",
            TlsPhase::RecordSuccess => "Done",
            TlsPhase::RecordFailure => "Failed",
        }
    }

    fn next(self) -> TlsPhase {
        match self {
            TlsPhase::Init => TlsPhase::ValidateInput,
            TlsPhase::ValidateInput => TlsPhase::MarkPending,
            TlsPhase::MarkPending => TlsPhase::Connect,
            TlsPhase::Connect => TlsPhase::PreconditionCheck,
            TlsPhase::PreconditionCheck => TlsPhase::IssueCertificate,
            TlsPhase::IssueCertificate => TlsPhase::TestConfig,
            TlsPhase::TestConfig => TlsPhase::Reload,
            TlsPhase::Reload => TlsPhase::RecordSuccess,
            // Terminal phases absorb
            TlsPhase::RecordSuccess => TlsPhase::RecordSuccess,
            TlsPhase::RecordFailure => TlsPhase::RecordFailure,
        }
    }
}

/// Tracks progress through the TLS provisioning sequence.
#[derive(Debug, Clone)]
pub struct TlsFsm {
    phase: TlsPhase,
}

impl TlsFsm {
    /// Create a new machine in the initial phase.
    pub fn new() -> Self {
        Self {
            phase: TlsPhase::Init,
        }
    }

    /// Get the current phase.
    pub fn phase(&self) -> TlsPhase {
        self.phase
    }

    /// Advance to the next phase in the fixed order.
    pub fn advance(&mut self) -> TlsPhase {
        self.phase = self.phase.next();
        self.phase
    }

    /// Abort: transition directly to the failure terminal.
    pub fn fail(&mut self) -> TlsPhase {
        self.phase = TlsPhase::RecordFailure;
        self.phase
    }

    /// Whether the machine reached a terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, TlsPhase::RecordSuccess | TlsPhase::RecordFailure)
    }
}

impl Default for TlsFsm {
    fn default() -> Self {
        Self::new()
    }
}
