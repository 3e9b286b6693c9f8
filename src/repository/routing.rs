//! Pure routing logic: maps the active controller, the component kind,
//! and the live-observed layer states to the adapter calls required to
//! reach the requested state.
//!
//! IFW blocking is meaningless on a PM-disabled component, and "enable"
//! means functionally reachable, so an enable through one layer first
//! clears the other layer when it reports blocked. A call is only emitted
//! for a layer whose observed state differs from the target; the broker
//! path always forwards its single call.

use crate::model::{ComponentType, ControllerType};

/// Which adapter executes a step of the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AdapterKind {
    Pm,
    Ifw,
    Proxy,
}

/// One adapter invocation: `enable == true` lifts the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AdapterCall {
    pub adapter: AdapterKind,
    pub enable: bool,
}

/// Layer states observed live immediately before planning. The persisted
/// cache is never consulted here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ObservedState {
    pub pm_blocked: bool,
    pub ifw_blocked: bool,
}

pub(crate) fn control_plan(
    controller: ControllerType,
    component_type: ComponentType,
    observed: ObservedState,
    enable: bool,
) -> Vec<AdapterCall> {
    match controller {
        ControllerType::Broker => vec![AdapterCall {
            adapter: AdapterKind::Proxy,
            enable,
        }],
        ControllerType::Pm => pm_path(observed, enable),
        ControllerType::Ifw => {
            // The IFW mechanism cannot address providers.
            if component_type == ComponentType::Provider {
                pm_path(observed, enable)
            } else {
                ifw_path(observed, enable)
            }
        }
    }
}

fn pm_path(observed: ObservedState, enable: bool) -> Vec<AdapterCall> {
    let mut calls = Vec::new();
    if enable && observed.ifw_blocked {
        calls.push(AdapterCall {
            adapter: AdapterKind::Ifw,
            enable: true,
        });
    }
    if observed.pm_blocked == enable {
        calls.push(AdapterCall {
            adapter: AdapterKind::Pm,
            enable,
        });
    }
    calls
}

fn ifw_path(observed: ObservedState, enable: bool) -> Vec<AdapterCall> {
    let mut calls = Vec::new();
    if enable && observed.pm_blocked {
        calls.push(AdapterCall {
            adapter: AdapterKind::Pm,
            enable: true,
        });
    }
    if observed.ifw_blocked == enable {
        calls.push(AdapterCall {
            adapter: AdapterKind::Ifw,
            enable,
        });
    }
    calls
}
