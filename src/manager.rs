//! The input manager.
//!
//! Single-threaded tick coordinator: owns every device, drains the
//! cross-thread queue, decides when staged state becomes observable, and
//! notifies listeners of the per-tick deltas. All device updates, listener
//! dispatch and registry mutation happen on the thread that calls
//! [`InputManager::update`]; producer threads reach the manager only
//! through the [`InputQueue`].

use log::{debug, info};

use crate::backends::{PlatformEvent, SyntheticEvent};
use crate::buttons::{ButtonType, DeviceButtonId};
use crate::config::InputConfig;
use crate::containers::DenseHashMap;
use crate::delta::{DeltaState, InputListener, ListenerId};
use crate::device::{
    DeviceButtonSpec, DeviceId, DeviceInput, DeviceInputValue, DeviceKind, DeviceState,
    DeviceVariant, InputDeviceOps, INVALID_DEVICE_ID,
};
use crate::devices::{KeyboardDevice, MouseDevice, PadDevice, TouchDevice};
use crate::error::{Error, Result};
use crate::mapping::MappingDatabase;
use crate::queue::{input_queue, Change, ChangeValue, InputQueue, QueueItem, QueuePair};
use crate::rumble::RumbleScheduler;
use std::sync::Arc;

/// Identifier for a registered state modifier.
pub type ModifierId = u64;

/// Per-frame hook that may rewrite device state between the early and late
/// device updates (axis inverters and the like).
pub trait DeviceStateModifier: Send {
    fn update(&mut self, devices: &mut DeviceRegistry, delta: Option<&mut DeltaState>);
}

/// Callback invoked when a device enters or leaves the registry.
pub type DeviceChangeCallback = Box<dyn FnMut(DeviceId, DeviceKind, u32, bool) + Send>;

enum OwnedDevice {
    Keyboard(KeyboardDevice),
    Mouse(MouseDevice),
    Touch(TouchDevice),
}

impl OwnedDevice {
    fn ops(&self) -> &dyn InputDeviceOps {
        match self {
            OwnedDevice::Keyboard(d) => d,
            OwnedDevice::Mouse(d) => d,
            OwnedDevice::Touch(d) => d,
        }
    }

    fn update(&mut self, delta: Option<&mut DeltaState>) {
        match self {
            OwnedDevice::Keyboard(d) => d.update(delta),
            OwnedDevice::Mouse(d) => d.update(delta),
            OwnedDevice::Touch(d) => d.update(delta),
        }
    }

    fn handle_event(&mut self, event: &PlatformEvent, delta: Option<&mut DeltaState>) {
        match self {
            OwnedDevice::Keyboard(d) => d.handle_event(event, delta),
            OwnedDevice::Mouse(d) => d.handle_event(event, delta),
            OwnedDevice::Touch(d) => d.handle_event(event, delta),
        }
    }

    fn is_late_update(&self) -> bool {
        match self {
            OwnedDevice::Keyboard(d) => d.is_late_update(),
            OwnedDevice::Mouse(d) => d.is_late_update(),
            OwnedDevice::Touch(d) => d.is_late_update(),
        }
    }
}

enum DeviceSlot {
    Owned(OwnedDevice),
    /// Index into the pad pool.
    Pad(usize),
}

/// Arena of registered devices plus the pad pool.
///
/// Pads that have not acquired an id live only in the pool; every id in the
/// map refers to a live device, and a device's self-reported id always
/// equals its map key.
#[derive(Default)]
pub struct DeviceRegistry {
    map: DenseHashMap<DeviceId, DeviceSlot>,
    pads: Vec<PadDevice>,
}

impl DeviceRegistry {
    /// Registered device, by id.
    pub fn get(&self, id: DeviceId) -> Option<&dyn InputDeviceOps> {
        match self.map.get(&id)? {
            DeviceSlot::Owned(device) => Some(device.ops()),
            DeviceSlot::Pad(index) => self.pads.get(*index).map(|p| p as &dyn InputDeviceOps),
        }
    }

    /// Registered device ids in registration order.
    pub fn ids(&self) -> Vec<DeviceId> {
        self.map.keys().copied().collect()
    }

    /// Rewrites a boolean button on a device's committed state, recording
    /// the transition. Modifier-facing.
    pub fn modify_bool(
        &mut self,
        id: DeviceId,
        button: DeviceButtonId,
        value: bool,
        delta: Option<&mut DeltaState>,
    ) {
        if let Some(state) = self.current_state_mut(id) {
            crate::delta::handle_button(id, state, delta, button, value);
        }
    }

    /// Rewrites a float axis on a device's committed state (no dead-zone;
    /// modifiers see post-dead-zone values).
    pub fn modify_float(
        &mut self,
        id: DeviceId,
        button: DeviceButtonId,
        value: f32,
        delta: Option<&mut DeltaState>,
    ) {
        if let Some(state) = self.current_state_mut(id) {
            crate::delta::handle_axis(id, state, delta, button, 0.0, value);
        }
    }

    fn current_state_mut(&mut self, id: DeviceId) -> Option<&mut crate::state::InputState> {
        let DeviceRegistry { map, pads } = self;
        match map.get_mut(&id)? {
            DeviceSlot::Owned(OwnedDevice::Keyboard(d)) => Some(d.current_state_mut()),
            DeviceSlot::Owned(OwnedDevice::Mouse(d)) => Some(d.current_state_mut()),
            DeviceSlot::Owned(OwnedDevice::Touch(d)) => Some(d.current_state_mut()),
            DeviceSlot::Pad(index) => pads.get_mut(*index).map(|p| p.current_state_mut()),
        }
    }
}

/// Owner of all input devices and driver of the per-frame pipeline.
pub struct InputManager {
    initialized: bool,
    config: InputConfig,
    registry: DeviceRegistry,
    next_device_id: DeviceId,
    listeners: DenseHashMap<ListenerId, Box<dyn InputListener>>,
    next_listener_id: ListenerId,
    sorted_listeners: Vec<ListenerId>,
    modifiers: DenseHashMap<ModifierId, Box<dyn DeviceStateModifier>>,
    next_modifier_id: ModifierId,
    delta: DeltaState,
    queue: QueuePair,
    pending_removals: Vec<DeviceId>,
    device_listener: Option<DeviceChangeCallback>,
    rumble: Option<RumbleScheduler>,
    #[cfg(feature = "hid")]
    hid: Option<crate::backends::hid::HidDiscovery>,
    mappings: Arc<MappingDatabase>,
    connection_probe_elapsed: f32,
    current_time_us: u64,
    time_remainder_ms: f32,
}

impl InputManager {
    pub fn new(config: InputConfig) -> Self {
        Self::with_mappings(config, MappingDatabase::builtin())
    }

    /// Manager with a caller-extended controller mapping database.
    pub fn with_mappings(config: InputConfig, mappings: MappingDatabase) -> Self {
        let queue = input_queue(config.concurrent_queue_capacity);
        Self {
            initialized: false,
            config,
            registry: DeviceRegistry::default(),
            next_device_id: 0,
            listeners: DenseHashMap::new(),
            next_listener_id: 0,
            sorted_listeners: Vec::new(),
            modifiers: DenseHashMap::new(),
            next_modifier_id: 0,
            delta: DeltaState::new(),
            queue,
            pending_removals: Vec::new(),
            device_listener: None,
            rumble: None,
            #[cfg(feature = "hid")]
            hid: None,
            mappings: Arc::new(mappings),
            connection_probe_elapsed: 0.0,
            current_time_us: 0,
            time_remainder_ms: 0.0,
        }
    }

    /// Binds OS resources and starts the rumble worker. Must be called once
    /// before any other operation; a second call fails.
    pub fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Err(Error::AlreadyInitialized);
        }
        self.rumble = Some(RumbleScheduler::new(self.config.max_pad_count)?);
        #[cfg(feature = "hid")]
        {
            if self.config.hid_discovery_enabled {
                self.hid = crate::backends::hid::HidDiscovery::new();
            }
        }
        self.initialized = true;
        info!("input manager initialized");
        Ok(())
    }

    /// Symmetric teardown: joins the rumble worker, notifies the device
    /// listener of every removal, and empties the registry. Only another
    /// `init` is valid afterwards.
    pub fn exit(&mut self) -> Result<()> {
        self.ensure_initialized()?;

        if let Some(mut rumble) = self.rumble.take() {
            rumble.shutdown();
        }
        #[cfg(feature = "hid")]
        {
            self.hid = None;
        }

        self.apply_pending_removals();

        for id in self.registry.ids() {
            if let Some(device) = self.registry.get(id) {
                let (kind, index) = (device.kind(), device.index());
                if let Some(cb) = self.device_listener.as_mut() {
                    cb(id, kind, index, false);
                }
            }
        }
        self.registry.map.clear();
        self.registry.pads.clear();
        self.initialized = false;
        info!("input manager shut down");
        Ok(())
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    fn mint_id(&mut self) -> DeviceId {
        let id = self.next_device_id;
        self.next_device_id += 1;
        id
    }

    /// Number of registered devices of one kind; doubles as the next
    /// device index.
    pub fn device_count_by_type(&self, kind: DeviceKind) -> u32 {
        self.registry
            .map
            .values()
            .filter(|slot| match slot {
                DeviceSlot::Owned(device) => device.ops().kind() == kind,
                DeviceSlot::Pad(_) => kind == DeviceKind::Pad,
            })
            .count() as u32
    }

    /// Creates and registers a keyboard device.
    pub fn create_keyboard(&mut self, variant: DeviceVariant) -> Result<DeviceId> {
        self.ensure_initialized()?;
        let index = self.device_count_by_type(DeviceKind::Keyboard);
        let backend = crate::backends::default_keyboard_backend(index, variant);
        let mut device =
            KeyboardDevice::new(index, self.config.text_input_queue_length, backend);
        let id = self.mint_id();
        device.set_device_id(id);
        self.registry
            .map
            .insert(id, DeviceSlot::Owned(OwnedDevice::Keyboard(device)));
        self.notify_device_listener(id, DeviceKind::Keyboard, index, true);
        Ok(id)
    }

    /// Creates and registers a mouse device.
    pub fn create_mouse(&mut self, variant: DeviceVariant) -> Result<DeviceId> {
        self.ensure_initialized()?;
        let index = self.device_count_by_type(DeviceKind::Mouse);
        let backend = crate::backends::default_mouse_backend(index, variant);
        let mut device = MouseDevice::new(index, backend);
        let id = self.mint_id();
        device.set_device_id(id);
        self.registry
            .map
            .insert(id, DeviceSlot::Owned(OwnedDevice::Mouse(device)));
        self.notify_device_listener(id, DeviceKind::Mouse, index, true);
        Ok(id)
    }

    /// Creates and registers a touch surface.
    pub fn create_touch(&mut self, variant: DeviceVariant) -> Result<DeviceId> {
        self.ensure_initialized()?;
        let index = self.device_count_by_type(DeviceKind::Touch);
        let backend = crate::backends::default_touch_backend(index, variant);
        let mut device = TouchDevice::new(index, backend);
        let id = self.mint_id();
        device.set_device_id(id);
        self.registry
            .map
            .insert(id, DeviceSlot::Owned(OwnedDevice::Touch(device)));
        self.notify_device_listener(id, DeviceKind::Touch, index, true);
        Ok(id)
    }

    /// Pre-allocates the pad pool. These are the only pads that will ever
    /// exist within this manager; they bind to hardware as the connection
    /// probe discovers it.
    pub fn create_controllers(&mut self, count: usize) -> Result<()> {
        self.ensure_initialized()?;
        if !self.registry.pads.is_empty() {
            return Err(Error::InvalidOperation("controller pool already created"));
        }
        let count = count.min(self.config.max_pad_count);
        for index in 0..count {
            let backend = crate::backends::default_pad_backend(index as u32, &self.mappings);
            self.registry.pads.push(PadDevice::new(
                index as u32,
                self.config.default_stick_deadzone,
                backend,
            ));
        }
        Ok(())
    }

    fn notify_device_listener(&mut self, id: DeviceId, kind: DeviceKind, index: u32, added: bool) {
        if let Some(cb) = self.device_listener.as_mut() {
            cb(id, kind, index, added);
        }
    }

    /// Installs the add/remove hook (replacing any previous one).
    pub fn set_device_listener(&mut self, listener: Option<DeviceChangeCallback>) {
        self.device_listener = listener;
    }

    /// Registers a listener; returns its id and re-sorts the dispatch order
    /// by descending priority (stable on ties).
    pub fn add_listener(&mut self, listener: Box<dyn InputListener>) -> ListenerId {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners.insert(id, listener);
        self.reorder_listeners();
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
        self.reorder_listeners();
    }

    fn reorder_listeners(&mut self) {
        self.sorted_listeners = self.listeners.keys().copied().collect();
        let listeners = &self.listeners;
        // Stable sort: equal priorities stay in registration order.
        self.sorted_listeners.sort_by(|a, b| {
            let pa = listeners.get(a).map(|l| l.priority()).unwrap_or(0);
            let pb = listeners.get(b).map(|l| l.priority()).unwrap_or(0);
            pb.cmp(&pa)
        });
    }

    pub fn add_device_state_modifier(&mut self, modifier: Box<dyn DeviceStateModifier>) -> ModifierId {
        let id = self.next_modifier_id;
        self.next_modifier_id += 1;
        self.modifiers.insert(id, modifier);
        id
    }

    pub fn remove_device_state_modifier(&mut self, id: ModifierId) {
        self.modifiers.remove(&id);
    }

    /// The tick. Probes connections on its cadence, drains the concurrent
    /// queue, updates every device (early, then modifiers, then late),
    /// notifies listeners of the recorded deltas, and applies pending
    /// removals.
    pub fn update(&mut self, delta_seconds: f32) -> Result<()> {
        self.ensure_initialized()?;

        // 1. Connection probe: the only discovery path for hot-plug pads.
        self.connection_probe_elapsed += delta_seconds;
        if self.connection_probe_elapsed * 1000.0 > self.config.check_connection_period_ms as f32 {
            self.probe_connections();
            self.connection_probe_elapsed = 0.0;
        }

        // 2. Advance the clock, carrying fractional milliseconds so long
        // runs do not drift.
        let total_ms = self.time_remainder_ms + delta_seconds * 1000.0;
        let whole_ms = total_ms.floor();
        self.time_remainder_ms = total_ms - whole_ms;
        self.current_time_us += whole_ms as u64 * 1000;

        let have_listeners = !self.listeners.is_empty();

        // 3./4. Drain the concurrent queue into staged state.
        while let Ok(item) = self.queue.consumer.try_recv() {
            match item {
                QueueItem::Change(change) => self.apply_change(change, have_listeners),
                QueueItem::Input(input) => self.apply_device_input(input, have_listeners),
            }
        }

        // 6. Early device updates.
        self.run_device_updates(false, have_listeners);

        // 7. Modifiers run between the early and late updates.
        {
            let Self {
                registry,
                modifiers,
                delta,
                ..
            } = self;
            for (_, modifier) in modifiers.iter_mut() {
                modifier.update(registry, ds(have_listeners, &mut *delta));
            }
        }

        // 8. Late device updates.
        self.run_device_updates(true, have_listeners);

        // Mid-tick hardware loss surfaces here, not next tick.
        self.reconcile_pad_bindings();

        // 9. Flush deltas to listeners in priority order, then clear.
        if have_listeners {
            self.delta
                .notify_listeners(delta_seconds, &self.sorted_listeners, &mut self.listeners);
            self.delta.clear();
        }

        // 11. Pending removals never persist across ticks.
        self.apply_pending_removals();

        Ok(())
    }

    fn run_device_updates(&mut self, late: bool, have_listeners: bool) {
        let Self {
            registry,
            delta,
            pending_removals,
            ..
        } = self;
        let DeviceRegistry { map, pads } = registry;
        for (id, slot) in map.iter_mut() {
            if pending_removals.contains(id) {
                continue;
            }
            match slot {
                DeviceSlot::Owned(device) => {
                    if device.is_late_update() == late {
                        device.update(ds(have_listeners, &mut *delta));
                    }
                }
                DeviceSlot::Pad(index) => {
                    if let Some(pad) = pads.get_mut(*index) {
                        if pad.is_late_update() == late {
                            pad.update(ds(have_listeners, &mut *delta));
                        }
                    }
                }
            }
        }
    }

    fn probe_connections(&mut self) {
        for pad in self.registry.pads.iter_mut() {
            pad.check_connection();
        }

        #[cfg(feature = "hid")]
        self.assign_hid_candidates();

        self.reconcile_pad_bindings();
    }

    #[cfg(feature = "hid")]
    fn assign_hid_candidates(&mut self) {
        let Some(hid) = self.hid.as_mut() else {
            return;
        };
        for candidate in hid.scan() {
            let slot = self
                .registry
                .pads
                .iter()
                .position(|p| p.device_state() == DeviceState::Unavailable && !p.has_override());
            let Some(slot) = slot else {
                debug!("no free pad slot for {}", candidate.name);
                return;
            };
            if let Some(backend) = hid.open(&candidate) {
                self.registry.pads[slot].attach_override(Box::new(backend));
            }
        }
    }

    /// Mints ids for pads that just bound hardware and retires ids of pads
    /// that lost it. Ids are never reused.
    fn reconcile_pad_bindings(&mut self) {
        for index in 0..self.registry.pads.len() {
            let (available, id) = {
                let pad = &self.registry.pads[index];
                (pad.device_state() != DeviceState::Unavailable, pad.device_id())
            };

            if available && id == INVALID_DEVICE_ID {
                let new_id = self.mint_id();
                self.registry.pads[index].set_device_id(new_id);
                self.registry.map.insert(new_id, DeviceSlot::Pad(index));
                info!("pad {index} bound as device {new_id}");
                self.notify_device_listener(new_id, DeviceKind::Pad, index as u32, true);
            } else if !available && id != INVALID_DEVICE_ID {
                self.pending_removals.push(id);
                let pad = &mut self.registry.pads[index];
                pad.set_device_id(INVALID_DEVICE_ID);
                pad.reset_state();
                info!("pad {index} lost device id {id}");
                self.notify_device_listener(id, DeviceKind::Pad, index as u32, false);
            }
        }
    }

    fn apply_pending_removals(&mut self) {
        for id in std::mem::take(&mut self.pending_removals) {
            self.registry.map.remove(&id);
        }
    }

    fn apply_change(&mut self, change: Change, have_listeners: bool) {
        let Self {
            registry, delta, ..
        } = self;
        let DeviceRegistry { map, pads } = registry;
        let Some(slot) = map.get_mut(&change.device) else {
            debug!("queued change for unknown device {}", change.device);
            return;
        };

        let (state, dead_zone) = match slot {
            DeviceSlot::Owned(OwnedDevice::Keyboard(d)) => (d.next_state_mut(), 0.0),
            DeviceSlot::Owned(OwnedDevice::Mouse(d)) => (d.next_state_mut(), 0.0),
            DeviceSlot::Owned(OwnedDevice::Touch(d)) => (d.next_state_mut(), 0.0),
            DeviceSlot::Pad(index) => {
                let Some(pad) = pads.get_mut(*index) else {
                    return;
                };
                let dz = pad.dead_zone(change.button);
                (pad.next_state_mut(), dz)
            }
        };

        match change.value {
            ChangeValue::Bool(value) => crate::delta::handle_button(
                change.device,
                state,
                ds(have_listeners, &mut *delta),
                change.button,
                value,
            ),
            ChangeValue::Float(value) => crate::delta::handle_axis(
                change.device,
                state,
                ds(have_listeners, &mut *delta),
                change.button,
                dead_zone,
                value,
            ),
        }
    }

    fn apply_device_input(&mut self, input: DeviceInput, have_listeners: bool) {
        if let DeviceInputValue::Connection(connected) = input.value {
            if input.kind == DeviceKind::Pad {
                let event = SyntheticEvent::PadConnection {
                    slot: input.index,
                    connected,
                };
                self.handle_synthetic(&event);
            }
            return;
        }

        let Some(id) = self.find_device_id(input.kind, input.index) else {
            debug!(
                "device input for unknown {:?} index {}",
                input.kind, input.index
            );
            return;
        };
        let change = Change {
            device: id,
            button: input.button,
            value: match input.value {
                DeviceInputValue::Bool(b) => ChangeValue::Bool(b),
                DeviceInputValue::Float(f) => ChangeValue::Float(f),
                DeviceInputValue::Connection(_) => unreachable!(),
            },
        };
        self.apply_change(change, have_listeners);
    }

    /// Cloneable producer handle for other threads.
    pub fn queue(&self) -> InputQueue {
        self.queue.producer.clone()
    }

    /// Thread-safe boolean change producer (drained next tick).
    pub fn enqueue_change_bool(&self, device: DeviceId, button: DeviceButtonId, value: bool) {
        self.queue.producer.enqueue_bool(device, button, value);
    }

    /// Thread-safe float change producer (drained next tick).
    pub fn enqueue_change_float(&self, device: DeviceId, button: DeviceButtonId, value: f32) {
        self.queue.producer.enqueue_float(device, button, value);
    }

    /// Embedder entry point for pre-translated records.
    pub fn handle_device_input(&self, input: DeviceInput) {
        self.queue.producer.enqueue_device_input(input);
    }

    /// X11 platform event entry point; routed to every device.
    #[cfg(target_os = "linux")]
    pub fn handle_event(&mut self, event: &::x11::xlib::XEvent) {
        self.route_event(&PlatformEvent::X11(event));
    }

    /// Win32 message entry point; routed to every device.
    #[cfg(windows)]
    pub fn handle_message(&mut self, msg: &windows_sys::Win32::UI::WindowsAndMessaging::MSG) {
        self.route_event(&PlatformEvent::WinMsg(msg));
    }

    /// Synthetic event entry point (tests, embedder glue).
    pub fn handle_synthetic(&mut self, event: &SyntheticEvent) {
        self.route_event(&PlatformEvent::Synthetic(event));
    }

    fn route_event(&mut self, event: &PlatformEvent) {
        let have_listeners = !self.listeners.is_empty();
        let Self {
            registry, delta, ..
        } = self;
        let DeviceRegistry { map, pads } = registry;
        for (_, slot) in map.iter_mut() {
            if let DeviceSlot::Owned(device) = slot {
                device.handle_event(event, ds(have_listeners, &mut *delta));
            }
        }
        // Pads are routed through the pool so unbound slots still observe
        // connection edges.
        for pad in pads.iter_mut() {
            pad.handle_event(event, ds(have_listeners, &mut *delta));
        }
    }

    /// O(1) device lookup; `None` for retired or unknown ids.
    pub fn get_device(&self, id: DeviceId) -> Option<&dyn InputDeviceOps> {
        self.registry.get(id)
    }

    /// Linear scan for the device of `kind` with the given per-kind index.
    pub fn find_device_id(&self, kind: DeviceKind, index: u32) -> Option<DeviceId> {
        self.registry.ids().into_iter().find(|id| {
            self.registry
                .get(*id)
                .is_some_and(|d| d.kind() == kind && d.index() == index)
        })
    }

    /// Same as [`find_device_id`](Self::find_device_id) but keyed by the
    /// stable type name (`"keyboard"`, `"mouse"`, `"pad"`, `"touch"`).
    pub fn find_device_id_by_name(&self, type_name: &str, index: u32) -> Option<DeviceId> {
        let kind = match type_name {
            "keyboard" => DeviceKind::Keyboard,
            "mouse" => DeviceKind::Mouse,
            "pad" => DeviceKind::Pad,
            "touch" => DeviceKind::Touch,
            _ => return None,
        };
        self.find_device_id(kind, index)
    }

    /// Scans every registered device for held buttons, appending to `out`
    /// until it is full. Returns the number of entries written; the scan
    /// deliberately truncates at the buffer size.
    pub fn any_button_down(&self, out: &mut [DeviceButtonSpec]) -> usize {
        let mut written = 0;
        for id in self.registry.ids() {
            if written >= out.len() {
                break;
            }
            if let Some(device) = self.registry.get(id) {
                written += device.any_button_down(&mut out[written..]);
            }
        }
        written
    }

    /// Releases every held button and zeroes every axis of one device, in
    /// both staged and committed state (used on focus loss).
    pub fn clear_all_states(&mut self, id: DeviceId) {
        let have_listeners = !self.listeners.is_empty();
        let mut held = [DeviceButtonSpec::default(); 256];
        let count = match self.registry.get(id) {
            Some(device) => device.any_button_down(&mut held),
            None => return,
        };

        for spec in &held[..count] {
            if spec.device != id {
                continue;
            }
            let button_type = self.registry.get(id).and_then(|d| d.button_type(spec.button));
            match button_type {
                Some(ButtonType::Bool) => {
                    self.apply_change(
                        Change {
                            device: id,
                            button: spec.button,
                            value: ChangeValue::Bool(false),
                        },
                        have_listeners,
                    );
                    self.registry.modify_bool(id, spec.button, false, None);
                }
                Some(ButtonType::Float) => {
                    self.apply_change(
                        Change {
                            device: id,
                            button: spec.button,
                            value: ChangeValue::Float(0.0),
                        },
                        have_listeners,
                    );
                    self.registry.modify_float(id, spec.button, 0.0, None);
                }
                None => {}
            }
        }
    }

    /// Monotonic time maintained by the tick, in microseconds.
    pub fn time_us(&self) -> u64 {
        self.current_time_us
    }

    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    /// The controller mapping database in use.
    pub fn mappings(&self) -> &MappingDatabase {
        &self.mappings
    }

    // ---- per-kind accessors ----

    pub fn keyboard(&self, id: DeviceId) -> Option<&KeyboardDevice> {
        match self.registry.map.get(&id)? {
            DeviceSlot::Owned(OwnedDevice::Keyboard(d)) => Some(d),
            _ => None,
        }
    }

    pub fn keyboard_mut(&mut self, id: DeviceId) -> Option<&mut KeyboardDevice> {
        match self.registry.map.get_mut(&id)? {
            DeviceSlot::Owned(OwnedDevice::Keyboard(d)) => Some(d),
            _ => None,
        }
    }

    pub fn mouse(&self, id: DeviceId) -> Option<&MouseDevice> {
        match self.registry.map.get(&id)? {
            DeviceSlot::Owned(OwnedDevice::Mouse(d)) => Some(d),
            _ => None,
        }
    }

    pub fn mouse_mut(&mut self, id: DeviceId) -> Option<&mut MouseDevice> {
        match self.registry.map.get_mut(&id)? {
            DeviceSlot::Owned(OwnedDevice::Mouse(d)) => Some(d),
            _ => None,
        }
    }

    pub fn pad(&self, id: DeviceId) -> Option<&PadDevice> {
        match self.registry.map.get(&id)? {
            DeviceSlot::Pad(index) => self.registry.pads.get(*index),
            _ => None,
        }
    }

    pub fn pad_mut(&mut self, id: DeviceId) -> Option<&mut PadDevice> {
        let DeviceRegistry { map, pads } = &mut self.registry;
        match map.get_mut(&id)? {
            DeviceSlot::Pad(index) => pads.get_mut(*index),
            _ => None,
        }
    }

    /// Queues a timed dual-motor effect for a bound pad.
    pub fn set_rumble_effect(
        &self,
        id: DeviceId,
        left: f32,
        right: f32,
        duration_ms: u32,
    ) -> bool {
        let Some(rumble) = self.rumble.as_ref() else {
            return false;
        };
        match self.registry.map.get(&id) {
            Some(DeviceSlot::Pad(index)) => self
                .registry
                .pads
                .get(*index)
                .map(|p| p.set_rumble_effect(rumble, left, right, duration_ms))
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Marks a device for the late update phase (after modifiers).
    pub fn set_late_update(&mut self, id: DeviceId, late: bool) {
        let DeviceRegistry { map, pads } = &mut self.registry;
        match map.get_mut(&id) {
            Some(DeviceSlot::Owned(OwnedDevice::Keyboard(d))) => d.set_late_update(late),
            Some(DeviceSlot::Owned(OwnedDevice::Mouse(d))) => d.set_late_update(late),
            Some(DeviceSlot::Owned(OwnedDevice::Touch(d))) => d.set_late_update(late),
            Some(DeviceSlot::Pad(index)) => {
                if let Some(pad) = pads.get_mut(*index) {
                    pad.set_late_update(late);
                }
            }
            None => {}
        }
    }
}

impl Drop for InputManager {
    fn drop(&mut self) {
        if self.initialized {
            let _ = self.exit();
        }
    }
}

#[inline]
fn ds(have_listeners: bool, delta: &mut DeltaState) -> Option<&mut DeltaState> {
    if have_listeners {
        Some(delta)
    } else {
        None
    }
}
