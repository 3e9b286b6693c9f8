use super::transport::{BrokerTransport, RemoteBroker};
use crate::error::EngineError;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};

/// A single operation executed against the remote broker.
#[derive(Debug, Clone)]
pub enum BrokerCommand {
    SetComponentEnabled {
        package: String,
        component: String,
        enabled: bool,
    },
    ForceStop {
        package: String,
    },
    ClearCache {
        package: String,
    },
    ClearData {
        package: String,
    },
    UninstallApp {
        package: String,
        version_code: i64,
    },
    RefreshRunningAppList,
    RefreshRunningServiceList,
    IsAppRunning {
        package: String,
    },
    IsServiceRunning {
        package: String,
        service: String,
    },
    StartService {
        package: String,
        service: String,
    },
    StopService {
        package: String,
        service: String,
    },
}

impl BrokerCommand {
    async fn execute(&self, remote: &Arc<dyn RemoteBroker>) -> Result<bool, EngineError> {
        match self {
            BrokerCommand::SetComponentEnabled {
                package,
                component,
                enabled,
            } => {
                remote
                    .set_component_enabled_setting(package, component, *enabled)
                    .await
            }
            BrokerCommand::ForceStop { package } => remote.force_stop(package).await,
            BrokerCommand::ClearCache { package } => remote.clear_cache(package).await,
            BrokerCommand::ClearData { package } => remote.clear_data(package).await,
            BrokerCommand::UninstallApp {
                package,
                version_code,
            } => remote.uninstall_app(package, *version_code).await,
            BrokerCommand::RefreshRunningAppList => remote.refresh_running_app_list().await,
            BrokerCommand::RefreshRunningServiceList => {
                remote.refresh_running_service_list().await
            }
            BrokerCommand::IsAppRunning { package } => remote.is_app_running(package).await,
            BrokerCommand::IsServiceRunning { package, service } => {
                remote.is_service_running(package, service).await
            }
            BrokerCommand::StartService { package, service } => {
                remote.start_service(package, service).await
            }
            BrokerCommand::StopService { package, service } => {
                remote.stop_service(package, service).await
            }
        }
    }
}

pub enum BrokerActorMessage {
    /// Execute a command; triggers a bounded bind when unbound.
    Invoke(BrokerCommand, RpcReplyPort<Result<bool, EngineError>>),
    /// Explicit bind; awaits the transport callback without a deadline.
    Bind(RpcReplyPort<Result<(), EngineError>>),
    /// Transport callback: the remote handle is live.
    Connected(Arc<dyn RemoteBroker>),
    /// Transport callback: the remote process died or the bind failed.
    Disconnected,
    /// Internal: a call-triggered bind exceeded its deadline.
    BindDeadline(u64),
}

impl std::fmt::Debug for BrokerActorMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrokerActorMessage::Invoke(cmd, _) => write!(f, "Invoke({cmd:?})"),
            BrokerActorMessage::Bind(_) => write!(f, "Bind"),
            BrokerActorMessage::Connected(_) => write!(f, "Connected"),
            BrokerActorMessage::Disconnected => write!(f, "Disconnected"),
            BrokerActorMessage::BindDeadline(seq) => write!(f, "BindDeadline({seq})"),
        }
    }
}

/// Connection lifecycle callbacks handed to the transport on bind.
#[derive(Clone)]
pub struct BrokerEvents {
    actor: ActorRef<BrokerActorMessage>,
}

impl BrokerEvents {
    pub fn connected(&self, remote: Arc<dyn RemoteBroker>) {
        let _ = self.actor.cast(BrokerActorMessage::Connected(remote));
    }

    pub fn disconnected(&self) {
        let _ = self.actor.cast(BrokerActorMessage::Disconnected);
    }
}

/// Cloneable handle for issuing calls through the broker bridge.
#[derive(Clone)]
pub struct BrokerHandle {
    actor: ActorRef<BrokerActorMessage>,
}

impl BrokerHandle {
    /// Explicitly establish the connection ahead of the first privileged
    /// call. Awaits the transport callback.
    pub async fn bind(&self) -> Result<(), EngineError> {
        ractor::call!(self.actor, BrokerActorMessage::Bind)
            .map_err(|e| EngineError::Actor(format!("Broker Bind RPC failed: {e}")))?
    }

    pub async fn invoke(&self, command: BrokerCommand) -> Result<bool, EngineError> {
        ractor::call!(self.actor, BrokerActorMessage::Invoke, command)
            .map_err(|e| EngineError::Actor(format!("Broker Invoke RPC failed: {e}")))?
    }

    pub async fn set_component_enabled(
        &self,
        package: &str,
        component: &str,
        enabled: bool,
    ) -> Result<bool, EngineError> {
        self.invoke(BrokerCommand::SetComponentEnabled {
            package: package.to_string(),
            component: component.to_string(),
            enabled,
        })
        .await
    }

    pub async fn force_stop(&self, package: &str) -> Result<bool, EngineError> {
        self.invoke(BrokerCommand::ForceStop {
            package: package.to_string(),
        })
        .await
    }

    pub async fn clear_cache(&self, package: &str) -> Result<bool, EngineError> {
        self.invoke(BrokerCommand::ClearCache {
            package: package.to_string(),
        })
        .await
    }

    pub async fn clear_data(&self, package: &str) -> Result<bool, EngineError> {
        self.invoke(BrokerCommand::ClearData {
            package: package.to_string(),
        })
        .await
    }

    pub async fn uninstall_app(
        &self,
        package: &str,
        version_code: i64,
    ) -> Result<bool, EngineError> {
        self.invoke(BrokerCommand::UninstallApp {
            package: package.to_string(),
            version_code,
        })
        .await
    }

    pub async fn refresh_running_app_list(&self) -> Result<bool, EngineError> {
        self.invoke(BrokerCommand::RefreshRunningAppList).await
    }

    pub async fn refresh_running_service_list(&self) -> Result<bool, EngineError> {
        self.invoke(BrokerCommand::RefreshRunningServiceList).await
    }

    pub async fn is_app_running(&self, package: &str) -> Result<bool, EngineError> {
        self.invoke(BrokerCommand::IsAppRunning {
            package: package.to_string(),
        })
        .await
    }

    pub async fn is_service_running(
        &self,
        package: &str,
        service: &str,
    ) -> Result<bool, EngineError> {
        self.invoke(BrokerCommand::IsServiceRunning {
            package: package.to_string(),
            service: service.to_string(),
        })
        .await
    }

    pub async fn start_service(&self, package: &str, service: &str) -> Result<bool, EngineError> {
        self.invoke(BrokerCommand::StartService {
            package: package.to_string(),
            service: service.to_string(),
        })
        .await
    }

    pub async fn stop_service(&self, package: &str, service: &str) -> Result<bool, EngineError> {
        self.invoke(BrokerCommand::StopService {
            package: package.to_string(),
            service: service.to_string(),
        })
        .await
    }
}

type CallWaiter = (BrokerCommand, RpcReplyPort<Result<bool, EngineError>>);

/// Connection state. Binding carries the waiters of the single in-flight
/// bind; overlapping callers join it instead of issuing another bind.
enum Link {
    Unbound,
    Binding {
        calls: Vec<CallWaiter>,
        binds: Vec<RpcReplyPort<Result<(), EngineError>>>,
    },
    Bound(Arc<dyn RemoteBroker>),
}

struct BrokerActorState {
    descriptor: String,
    transport: Arc<dyn BrokerTransport>,
    bind_timeout: Duration,
    link: Link,
    deadline_seq: u64,
}

struct BrokerActor;

#[ractor::async_trait]
impl Actor for BrokerActor {
    type Msg = BrokerActorMessage;
    type State = BrokerActorState;
    type Arguments = (String, Arc<dyn BrokerTransport>, Duration);

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let (descriptor, transport, bind_timeout) = args;
        Ok(BrokerActorState {
            descriptor,
            transport,
            bind_timeout,
            link: Link::Unbound,
            deadline_seq: 0,
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            BrokerActorMessage::Invoke(command, reply) => {
                if let Link::Bound(remote) = &state.link {
                    // Executed inline so commands reach the remote in
                    // mailbox order, matching its serial processing.
                    let remote = remote.clone();
                    let res = command.execute(&remote).await;
                    let _ = reply.send(res);
                    return Ok(());
                }
                let needs_bind = matches!(state.link, Link::Unbound);
                if needs_bind {
                    state.link = Link::Binding {
                        calls: Vec::new(),
                        binds: Vec::new(),
                    };
                }
                if let Link::Binding { calls, .. } = &mut state.link {
                    calls.push((command, reply));
                }
                if needs_bind {
                    start_bind(&myself, state);
                }
                arm_deadline(&myself, state);
            }
            BrokerActorMessage::Bind(reply) => {
                if let Link::Bound(_) = &state.link {
                    let _ = reply.send(Ok(()));
                    return Ok(());
                }
                let needs_bind = matches!(state.link, Link::Unbound);
                if needs_bind {
                    state.link = Link::Binding {
                        calls: Vec::new(),
                        binds: Vec::new(),
                    };
                }
                if let Link::Binding { binds, .. } = &mut state.link {
                    binds.push(reply);
                }
                if needs_bind {
                    start_bind(&myself, state);
                }
            }
            BrokerActorMessage::Connected(remote) => {
                let previous = std::mem::replace(&mut state.link, Link::Bound(remote.clone()));
                if let Link::Binding { calls, binds } = previous {
                    info!(
                        descriptor = %state.descriptor,
                        queued_calls = calls.len(),
                        "broker connected, draining waiters"
                    );
                    for reply in binds {
                        let _ = reply.send(Ok(()));
                    }
                    for (command, reply) in calls {
                        let res = command.execute(&remote).await;
                        let _ = reply.send(res);
                    }
                } else {
                    info!(descriptor = %state.descriptor, "broker connected");
                }
            }
            BrokerActorMessage::Disconnected => {
                let previous = std::mem::replace(&mut state.link, Link::Unbound);
                match previous {
                    Link::Binding { calls, binds } => {
                        warn!(descriptor = %state.descriptor, "broker bind failed");
                        for reply in binds {
                            let _ = reply
                                .send(Err(EngineError::BrokerUnavailable("bind failed".into())));
                        }
                        for (_, reply) in calls {
                            let _ = reply
                                .send(Err(EngineError::BrokerUnavailable("bind failed".into())));
                        }
                    }
                    Link::Bound(_) => {
                        warn!(descriptor = %state.descriptor, "broker remote died, connection dropped");
                    }
                    Link::Unbound => {}
                }
            }
            BrokerActorMessage::BindDeadline(seq) => {
                if seq != state.deadline_seq {
                    return Ok(());
                }
                if let Link::Binding { calls, .. } = &mut state.link {
                    if calls.is_empty() {
                        return Ok(());
                    }
                    warn!(
                        descriptor = %state.descriptor,
                        waiters = calls.len(),
                        "bind deadline exceeded, failing queued calls"
                    );
                    for (_, reply) in calls.drain(..) {
                        let _ = reply
                            .send(Err(EngineError::BrokerUnavailable("bind timed out".into())));
                    }
                }
            }
        }
        Ok(())
    }
}

fn start_bind(myself: &ActorRef<BrokerActorMessage>, state: &BrokerActorState) {
    debug!(descriptor = %state.descriptor, "issuing broker bind");
    state.transport.bind(
        &state.descriptor,
        BrokerEvents {
            actor: myself.clone(),
        },
    );
}

/// Bounds call-triggered waits. Explicit `bind()` waiters are exempt; they
/// legitimately await the transport callback.
fn arm_deadline(myself: &ActorRef<BrokerActorMessage>, state: &mut BrokerActorState) {
    state.deadline_seq += 1;
    let seq = state.deadline_seq;
    let _ = myself.send_after(state.bind_timeout, move || {
        BrokerActorMessage::BindDeadline(seq)
    });
}

/// Spawn a broker bridge for one elevation channel. Actors are anonymous
/// so several engines can coexist in one process.
pub async fn spawn(
    descriptor: &str,
    transport: Arc<dyn BrokerTransport>,
    bind_timeout: Duration,
) -> Result<BrokerHandle, EngineError> {
    let (actor, _jh) = Actor::spawn(
        None,
        BrokerActor,
        (descriptor.to_string(), transport, bind_timeout),
    )
    .await
    .map_err(|e| EngineError::Actor(format!("failed to spawn broker actor {descriptor}: {e}")))?;

    Ok(BrokerHandle { actor })
}
