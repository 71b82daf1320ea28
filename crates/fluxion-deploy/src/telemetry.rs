// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Upgrade events, written to the log as JSON records

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub enum UpgradeEvent {
    CodePulled {
        branch: String,
        from_commit: String,
        to_commit: String,
    },
    UpgradeStarted {
        from_version: String,
        to_version: String,
    },
    ServicesStopped,
    VersionSwapped {
        from_version: String,
        to_version: String,
        backup_path: String,
    },
    ServicesRestarted,
    UpgradeAborted {
        step: String,
        services_stopped: bool,
    },
}

#[derive(Debug, Serialize)]
struct EventRecord<'a> {
    at: DateTime<Utc>,
    event: &'a UpgradeEvent,
}

/// Log an upgrade event. Never fails the workflow on its own.
pub fn report_event(event: &UpgradeEvent) -> Result<()> {
    let record = EventRecord {
        at: Utc::now(),
        event,
    };
    let event_json = serde_json::to_string(&record)?;
    tracing::info!(target: "fluxion_deploy::events", "{event_json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_swapped_serialization() {
        let event = UpgradeEvent::VersionSwapped {
            from_version: "4.2.9".to_owned(),
            to_version: "4.3.0".to_owned(),
            backup_path: "/opt/fluxion/.installed-version.bak".to_owned(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("VersionSwapped"));
        assert!(json.contains("4.2.9"));
        assert!(json.contains(".installed-version.bak"));
    }

    #[test]
    fn test_unit_variant_serialization() {
        let json = serde_json::to_string(&UpgradeEvent::ServicesStopped).unwrap();
        assert_eq!(json, "\"ServicesStopped\"");
    }

    #[test]
    fn test_report_event() {
        assert!(report_event(&UpgradeEvent::ServicesRestarted).is_ok());
    }
}
