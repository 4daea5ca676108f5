//! Agent event systems.
//!
//! Bridge the event feed thread with the scene:
//! - [`poll_event_feed`] drains the feed channel into `Messages<AgentEvent>`
//! - [`update_agent_event_messages`] advances the message queue
//! - [`apply_agent_events`] maps each event to an animation state and hands
//!   it to the [`SceneManager`]
//!
//! Run them chained, in that order.

use bevy_ecs::prelude::*;
use log::debug;

use crate::events::agentevent::{AgentEvent, event_to_animation_state};
use crate::resources::eventfeed::EventFeed;
use crate::resources::scenemanager::SceneManager;
use crate::resources::worldtime::WallTime;

/// Drain pending events from the feed thread without blocking.
pub fn poll_event_feed(feed: Res<EventFeed>, mut writer: MessageWriter<AgentEvent>) {
    writer.write_batch(feed.rx.try_iter());
}

/// Advance the ECS message queue for [`AgentEvent`].
pub fn update_agent_event_messages(mut msgs: ResMut<Messages<AgentEvent>>) {
    msgs.update();
}

pub fn apply_agent_events(
    mut reader: MessageReader<AgentEvent>,
    mut scene: ResMut<SceneManager>,
    wall: Res<WallTime>,
) {
    for event in reader.read() {
        let state = event_to_animation_state(event);
        debug!("event {} -> {}", event.kind.as_str(), state);
        scene.set_status(event.describe());
        scene.set_animation_state(state, wall.now);
    }
}
