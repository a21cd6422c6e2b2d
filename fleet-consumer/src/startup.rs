use std::sync::Arc;

use async_channel::{Receiver, Sender};
use fleet_cluster::ClusterOptions;
use fleet_core::UpdateMessage;
use fleet_state::{FleetSnapshot, FleetView, VesselStore};
use futures::Stream;
use snafu::ResultExt;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{Level, event, instrument};
use tracing_subscriber::FmtSubscriber;

use crate::{
    consumer::Consumer,
    error::{
        Result,
        error::{JoinSnafu, StateSnafu, TracingSnafu},
    },
    models::RawEvent,
    settings::{LogLevel, Settings},
};

pub struct App {
    consumer: Consumer,
    store: VesselStore,
    sender: Sender<UpdateMessage>,
    receiver: Receiver<UpdateMessage>,
    clustering: ClusterOptions,
    view_max_zoom: u8,
}

impl App {
    pub fn build(settings: &Settings) -> App {
        let (sender, receiver) = async_channel::bounded(settings.channel_capacity.max(1));

        App {
            consumer: Consumer::new(settings.commit_interval),
            store: VesselStore::new(settings.reconcile.clone()),
            sender,
            receiver,
            clustering: settings.clustering,
            view_max_zoom: settings.view_max_zoom,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<FleetSnapshot>> {
        self.store.subscribe()
    }

    /// A view over the store that stays current while the app runs.
    pub fn fleet_view(&self) -> Result<FleetView> {
        FleetView::new(self.store.subscribe(), self.clustering, self.view_max_zoom)
            .context(StateSnafu)
    }

    /// Feeds `source` into the store until it is cancelled or runs dry.
    ///
    /// Every message already handed to the store is applied before this returns, the last
    /// snapshot stays readable through earlier subscriptions.
    pub async fn run(
        self,
        source: impl Stream<Item = RawEvent> + Unpin,
        cancellation: CancellationToken,
    ) -> Result<()> {
        self.run_impl(source, cancellation, None).await
    }

    pub async fn run_test(
        self,
        source: impl Stream<Item = RawEvent> + Unpin,
        cancellation: CancellationToken,
        process_confirmation: mpsc::Sender<()>,
    ) -> Result<()> {
        self.run_impl(source, cancellation, Some(process_confirmation))
            .await
    }

    #[instrument(skip_all)]
    async fn run_impl(
        self,
        source: impl Stream<Item = RawEvent> + Unpin,
        cancellation: CancellationToken,
        process_confirmation: Option<mpsc::Sender<()>>,
    ) -> Result<()> {
        let App {
            consumer,
            store,
            sender,
            receiver,
            ..
        } = self;

        let store_task = tokio::spawn(store.consume_loop(receiver, process_confirmation));

        // The sender is dropped on return, which ends the store loop once it has drained.
        let result = consumer.run(source, sender, cancellation).await;
        if let Err(e) = &result {
            event!(Level::ERROR, "event consumer stopped: {e:?}");
        }

        store_task.await.context(JoinSnafu)?;
        result
    }
}

pub fn init_tracing(log_level: LogLevel) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(tracing::Level::from(log_level))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context(TracingSnafu)
}
