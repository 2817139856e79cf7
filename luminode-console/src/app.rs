use std::io::{self, Write};
use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::{mpsc, watch};

use luminode_core::publisher::CommandSink;
use luminode_core::signature::RenderDecision;
use luminode_core::{CommandPublisher, ControlCenter, IngressReceiver, Pipeline, RenderScheduler, ingress_queue};

use crate::configs::settings::Settings;
use crate::errors::ConsoleError;
use crate::handles::input_handle::{OperatorAction, spawn_input_reader};
use crate::handles::view_handle::{TextView, ViewState};
use crate::services::command_service::MqttCommandSink;
use crate::services::subscriber_service::{LinkStatus, TelemetrySubscriber, create_client};

/// Consumer side of the console: session state, scheduler, operator controls and the view.
pub struct Console<S> {
    pipeline: Pipeline,
    scheduler: RenderScheduler,
    control: ControlCenter<S>,
    view: TextView,
    state: ViewState,
}

impl<S: CommandSink> Console<S> {
    pub fn new(control: ControlCenter<S>, view: TextView) -> Self {
        Self {
            pipeline: Pipeline::new(),
            scheduler: RenderScheduler::new(),
            control,
            view,
            state: ViewState::default(),
        }
    }

    pub fn with_scheduler(mut self, scheduler: RenderScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Drain telemetry and report whether the active page must be redrawn.
    pub async fn cycle(&mut self, ingress: &mut IngressReceiver) -> RenderDecision {
        self.scheduler.run_cycle(&mut self.pipeline, ingress, self.state.page).await
    }

    /// Apply an operator action. Returns `true` when the frame should be redrawn right away.
    /// Page switches are left to the scheduler and unchanged control edits redraw nothing.
    pub fn apply(&mut self, action: OperatorAction) -> bool {
        let store = self.pipeline.store_mut();

        match action {
            OperatorAction::ShowPage(page) => {
                self.state.page = page;
                false
            }
            OperatorAction::Filter(filter) => {
                self.state.filter = filter;
                true
            }
            OperatorAction::Period(period) => {
                self.state.period = period;
                true
            }
            OperatorAction::Select(node_id) => {
                self.state.selected = Some(node_id);
                true
            }
            OperatorAction::SetMode { node_id, mode } => self.control.set_mode(store, &node_id, mode),
            OperatorAction::SetThreshold { node_id, threshold } => {
                self.control.set_lux_threshold(store, &node_id, threshold)
            }
            OperatorAction::Switch { node_id, state } => {
                self.control.switch(store, &node_id, state);
                true
            }
            OperatorAction::SetSchedule { node_id, start, end } => self.control.set_schedule(store, &node_id, start, end),
            OperatorAction::Quit => false,
        }
    }

    pub fn render(&self, link: &LinkStatus) -> String {
        self.view.render(&self.state, self.pipeline.store(), link, OffsetDateTime::now_utc())
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }
}

pub async fn run(settings: &Arc<Settings>) -> Result<(), ConsoleError> {
    let (ingress_tx, mut ingress) = ingress_queue();
    let (link_tx, mut link_rx) = watch::channel(LinkStatus::Connecting);
    let (client, event_loop) = create_client(&settings.broker);

    tracing::info!(host = %settings.broker.host, port = settings.broker.port, "connecting to broker");

    TelemetrySubscriber::new(client.clone(), event_loop, &settings.topics.stream, ingress_tx, link_tx).spawn();

    let (action_tx, mut actions) = mpsc::unbounded_channel();
    spawn_input_reader(action_tx);

    let publisher = CommandPublisher::new(MqttCommandSink::new(client.clone()), settings.topics.control.clone());
    let mut console = Console::new(ControlCenter::new(publisher), TextView::new(settings.billing.tariff_per_kwh));

    loop {
        if console.cycle(&mut ingress).await.should_render() {
            present(&console.render(&link_rx.borrow()))?;
        }

        tokio::select! {
            ready = ingress.ready() => {
                if !ready {
                    tracing::warn!("telemetry subscriber stopped");
                    break;
                }
            }
            Some(action) = actions.recv() => {
                if action == OperatorAction::Quit {
                    break;
                }
                if console.apply(action) {
                    present(&console.render(&link_rx.borrow()))?;
                }
            }
            Ok(()) = link_rx.changed() => {
                let link = link_rx.borrow_and_update().clone();
                present(&console.render(&link))?;
            }
        }
    }

    if let Err(e) = client.try_disconnect() {
        tracing::debug!("Failed to disconnect: {}", e);
    }

    Ok(())
}

fn present(frame: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{frame}")?;
    writeln!(stdout)?;
    stdout.flush()
}
