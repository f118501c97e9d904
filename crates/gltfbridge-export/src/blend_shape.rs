//! Blend shape target isolation
//!
//! Sampling one blend shape target means driving a deformer's weight
//! channels so that exactly one target is active. [`BlendShapeIsolator`]
//! snapshots every channel of a weight array on construction (value, lock
//! flag, incoming and outgoing connections) and puts all of it back when it
//! is restored or dropped, whichever exit path is taken.
//!
//! ```
//! use gltfbridge_core::Plug;
//! use gltfbridge_export::blend_shape::isolate;
//! use gltfbridge_host::{MemoryScene, SceneGraph};
//!
//! let mut scene = MemoryScene::new();
//! let blend = scene.add_node("blendShape1", "blendShape");
//! let weights = scene.set_array(blend, "weight", &[0.25, 1.0]);
//!
//! let sampled = isolate(&mut scene, weights.clone(), |iso| {
//!     iso.sample_targets(|_, scene| scene.plug_value(&weights.element(0)))
//! })
//! .unwrap();
//!
//! assert_eq!(sampled, vec![0.25, 0.0]);
//! assert_eq!(scene.plug_value(&weights.element(1)).unwrap(), 1.0);
//! ```

use gltfbridge_core::{Error, Plug, Result, ResultExt};
use gltfbridge_host::SceneGraph;

/// Snapshot of one weight channel taken when the isolator was created
#[derive(Debug, Clone, PartialEq)]
pub struct WeightChannelState {
    pub plug: Plug,
    pub weight: f64,
    pub locked: bool,
    pub incoming: Vec<Plug>,
    pub outgoing: Vec<Plug>,
}

impl WeightChannelState {
    fn capture<G: SceneGraph + ?Sized>(scene: &G, plug: Plug) -> Result<Self> {
        Ok(Self {
            weight: scene.plug_value(&plug)?,
            locked: scene.is_locked(&plug)?,
            incoming: scene.incoming(&plug)?,
            outgoing: scene.outgoing(&plug)?,
            plug,
        })
    }
}

/// Scoped manipulation of a deformer's weight channels.
///
/// Channels are addressed by their position in the weight array's element
/// list, which need not match the logical element index.
///
/// Dropping the isolator restores the channels too, but a failure there can
/// only be logged. Call [`restore`](Self::restore) or use [`isolate`] to get
/// [`Error::RestoreFailed`] back.
pub struct BlendShapeIsolator<'a, G: SceneGraph + ?Sized> {
    scene: &'a mut G,
    weight_array: Plug,
    channels: Vec<WeightChannelState>,
    restored: bool,
}

impl<'a, G: SceneGraph + ?Sized> BlendShapeIsolator<'a, G> {
    /// Snapshot every element of `weight_array`
    pub fn new(scene: &'a mut G, weight_array: Plug) -> Result<Self> {
        let channels = scene
            .element_plugs(&weight_array)?
            .into_iter()
            .map(|plug| WeightChannelState::capture(&*scene, plug))
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("recording weight channels of {weight_array}"))?;

        tracing::debug!(weights = %weight_array, channels = channels.len(), "Isolating blend shape weights");

        Ok(Self {
            scene,
            weight_array,
            channels,
            restored: false,
        })
    }

    pub fn weight_array(&self) -> &Plug {
        &self.weight_array
    }

    /// Number of weight channels
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn weight_plug(&self, index: usize) -> Option<&Plug> {
        self.channels.get(index).map(|channel| &channel.plug)
    }

    /// Weight of a channel when the isolator was created
    pub fn original_weight(&self, index: usize) -> Option<f64> {
        self.channels.get(index).map(|channel| channel.weight)
    }

    pub fn original_state(&self, index: usize) -> Option<&WeightChannelState> {
        self.channels.get(index)
    }

    pub fn scene(&self) -> &G {
        &*self.scene
    }

    pub fn scene_mut(&mut self) -> &mut G {
        &mut *self.scene
    }

    /// Give channel `index` its original weight and every other channel 0.
    ///
    /// Connections that would drive a channel are severed and locked
    /// channels are unlocked; both come back on restore. The result depends
    /// only on the snapshot, not on earlier calls.
    pub fn clear_weights_except_for(&mut self, index: usize) -> Result<()> {
        if index >= self.channels.len() {
            return Err(Error::ChannelOutOfRange {
                index,
                count: self.channels.len(),
            });
        }

        for (position, channel) in self.channels.iter().enumerate() {
            let plug = &channel.plug;
            for source in self.scene.incoming(plug)? {
                self.scene.disconnect(&source, plug)?;
            }
            if self.scene.is_locked(plug)? {
                self.scene.set_locked(plug, false)?;
            }

            let weight = if position == index { channel.weight } else { 0.0 };
            self.scene.set_plug_value(plug, weight)?;
        }

        tracing::trace!(weights = %self.weight_array, index, "Activated weight channel");
        Ok(())
    }

    /// Alias of [`clear_weights_except_for`](Self::clear_weights_except_for)
    pub fn activate_only(&mut self, index: usize) -> Result<()> {
        self.clear_weights_except_for(index)
    }

    /// Sever every recorded connection of every channel, leaving values as
    /// they are
    pub fn break_connections(&mut self) -> Result<()> {
        for channel in &self.channels {
            let plug = &channel.plug;

            let current = self.scene.incoming(plug)?;
            for source in channel.incoming.iter().filter(|source| current.contains(*source)) {
                self.scene.disconnect(source, plug)?;
            }

            let current = self.scene.outgoing(plug)?;
            for destination in channel.outgoing.iter().filter(|destination| current.contains(*destination)) {
                self.scene.disconnect(plug, destination)?;
            }
        }
        Ok(())
    }

    /// Alias of [`break_connections`](Self::break_connections)
    pub fn break_all(&mut self) -> Result<()> {
        self.break_connections()
    }

    /// Activate each channel in turn and call `sample` with the scene in
    /// that state
    pub fn sample_targets<T>(&mut self, mut sample: impl FnMut(usize, &G) -> Result<T>) -> Result<Vec<T>> {
        let mut samples = Vec::with_capacity(self.channels.len());
        for index in 0..self.channels.len() {
            self.clear_weights_except_for(index)?;
            samples.push(sample(index, &*self.scene)?);
        }
        Ok(samples)
    }

    /// Put every channel back the way it was and report anything that could
    /// not be re-established
    pub fn restore(mut self) -> Result<()> {
        self.restore_channels()
    }

    fn restore_channels(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;

        // Every channel is released before any is reattached, so a sibling's
        // stray driver cannot block a recorded connection into it
        let steps: [RestoreStep<G>; 3] = [release_channel::<G>, reattach_channel::<G>, relock_channel::<G>];
        let mut failures = Vec::new();
        for step in steps {
            for channel in &self.channels {
                let mut errors = Vec::new();
                step(&mut *self.scene, channel, &mut errors);
                failures.extend(errors.into_iter().map(|e| format!("{}: {e}", channel.plug)));
            }
        }

        if failures.is_empty() {
            tracing::debug!(weights = %self.weight_array, "Restored blend shape weights");
            Ok(())
        } else {
            Err(Error::RestoreFailed { failures })
        }
    }
}

impl<G: SceneGraph + ?Sized> Drop for BlendShapeIsolator<'_, G> {
    fn drop(&mut self) {
        if let Err(e) = self.restore_channels() {
            tracing::error!(weights = %self.weight_array, error = %e, "Blend shape weights left modified");
        }
    }
}

type RestoreStep<G> = fn(&mut G, &WeightChannelState, &mut Vec<Error>);

/// Unlock a channel and drop drivers attached while isolated
fn release_channel<G: SceneGraph + ?Sized>(scene: &mut G, channel: &WeightChannelState, failures: &mut Vec<Error>) {
    let plug = &channel.plug;
    if record(failures, scene.is_locked(plug)) == Some(true) {
        record(failures, scene.set_locked(plug, false));
    }

    let current = record(failures, scene.incoming(plug)).unwrap_or_default();
    for source in current.iter().filter(|source| !channel.incoming.contains(*source)) {
        record(failures, scene.disconnect(source, plug));
    }
}

/// Put back the recorded value and connections of a released channel
fn reattach_channel<G: SceneGraph + ?Sized>(scene: &mut G, channel: &WeightChannelState, failures: &mut Vec<Error>) {
    let plug = &channel.plug;

    if channel.incoming.is_empty() {
        record(failures, scene.set_plug_value(plug, channel.weight));
    }
    let current = record(failures, scene.incoming(plug)).unwrap_or_default();
    for source in channel.incoming.iter().filter(|source| !current.contains(*source)) {
        record(failures, scene.connect(source, plug));
    }

    let current = record(failures, scene.outgoing(plug)).unwrap_or_default();
    for destination in channel.outgoing.iter().filter(|destination| !current.contains(*destination)) {
        record(failures, scene.connect(plug, destination));
    }
}

fn relock_channel<G: SceneGraph + ?Sized>(scene: &mut G, channel: &WeightChannelState, failures: &mut Vec<Error>) {
    if channel.locked {
        record(failures, scene.set_locked(&channel.plug, true));
    }
}

fn record<T>(failures: &mut Vec<Error>, result: Result<T>) -> Option<T> {
    result.map_err(|e| failures.push(e)).ok()
}

/// Run `body` against an isolator over `weight_array` and restore
/// afterwards.
///
/// A restore failure is returned in preference to the body's own result,
/// since it means the scene was left modified.
pub fn isolate<G, T, F>(scene: &mut G, weight_array: Plug, body: F) -> Result<T>
where
    G: SceneGraph + ?Sized,
    F: FnOnce(&mut BlendShapeIsolator<'_, G>) -> Result<T>,
{
    let mut isolator = BlendShapeIsolator::new(scene, weight_array)?;
    let outcome = body(&mut isolator);

    match isolator.restore() {
        Ok(()) => outcome,
        Err(restore_error) => {
            if let Err(e) = &outcome {
                tracing::warn!(error = %e, "Isolation failed before restore");
            }
            Err(restore_error)
        }
    }
}
