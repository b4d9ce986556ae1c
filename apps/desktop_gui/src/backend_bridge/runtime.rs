//! Worker thread that owns the tokio runtime and the advisor client.

use std::{sync::Arc, thread, time::Duration};

use client_core::{AdvisorClient, ClientEvent, HttpPredictionBackend};
use crossbeam_channel::{Receiver, Sender};

use crate::{
    backend_bridge::commands::BackendCommand,
    controller::events::UiEvent,
    settings::Settings,
};

pub fn launch(settings: Settings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::FatalStartup(format!(
                    "backend worker startup failure: failed to build runtime: {err}"
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let backend = match HttpPredictionBackend::with_timeout(
                &settings.backend_url,
                Duration::from_secs(settings.request_timeout_seconds),
            ) {
                Ok(backend) => backend,
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::FatalStartup(format!(
                        "backend worker startup failure: {err}"
                    )));
                    tracing::error!("failed to build http backend: {err}");
                    return;
                }
            };
            let client = AdvisorClient::new(Arc::new(backend));

            let mut events = client.subscribe_events();
            let ui_tx_events = ui_tx.clone();
            tokio::spawn(async move {
                while let Ok(event) = events.recv().await {
                    let evt = match event {
                        ClientEvent::CatalogLoaded { soil_types } => {
                            UiEvent::CatalogLoaded { soil_types }
                        }
                        ClientEvent::StatusChanged(status) => UiEvent::StatusChanged(status),
                    };
                    let _ = ui_tx_events.try_send(evt);
                }
            });

            let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::LoadSoilTypes => {
                        tracing::info!(backend_url = %settings.backend_url, "backend: load_soil_types");
                        // Failures surface through StatusChanged events.
                        if let Err(err) = client.load_soil_types().await {
                            tracing::error!("backend: load_soil_types failed: {err}");
                        }
                    }
                    BackendCommand::Predict { input } => {
                        tracing::info!("backend: predict");
                        client.replace_form(input).await;
                        if let Err(err) = client.submit().await {
                            tracing::error!("backend: predict failed: {err}");
                        }
                    }
                }
            }
        });
    });
}
