//! Generic host: drives any set of blocks through one uniform interface.
//!
//! ```text
//!            ┌────────────── step() ───────────────┐
//!            │ 1. copy linked outputs → inputs     │
//!            │ 2. tick every block whose divider   │
//!            │    says it is due this base period  │
//!            └─────────────────────────────────────┘
//!   CanFrame ──dispatch_frame()──▶ every block that accepts the id
//! ```
//!
//! Blocks are stored type-erased behind [`DynBlock`], so the registry
//! never needs per-block code.

use embedded_can::Id;
use log::{info, warn};

use crate::app::events::HostEvent;
use crate::app::instance::{BlockInstance, Phase};
use crate::app::ports::EventSink;
use crate::block::Block;
use crate::block::fields::{FieldDescriptor, FieldValue, Record};
use crate::can::{CanFrame, raw_id};
use crate::config::BlockConfig;
use crate::error::{Error, FieldError, Result};
use crate::schedule::RateDivider;

// ───────────────────────────────────────────────────────────────
// Object-safe block view
// ───────────────────────────────────────────────────────────────

/// What the registry needs from a block instance, without its type.
pub trait DynBlock {
    fn name(&self) -> &'static str;
    fn phase(&self) -> Phase;
    fn ticks_per_s(&self) -> u8;

    fn init(&mut self) -> Result<()>;
    fn tick(&mut self) -> Result<()>;

    fn accepts(&self, id: Id) -> bool;
    /// `Ok(false)` when the block does not consume `id`.
    fn route_frame(&mut self, id: Id, payload: &[u8]) -> Result<bool>;

    fn input_descriptor(&self, name: &str) -> Option<&'static FieldDescriptor>;
    fn output_descriptor(&self, name: &str) -> Option<&'static FieldDescriptor>;
    fn set_input(&mut self, name: &str, value: FieldValue) -> Result<()>;
    fn output(&self, name: &str) -> Option<FieldValue>;
    fn output_fields(&self) -> &'static [FieldDescriptor];
}

impl<B: Block> DynBlock for BlockInstance<B> {
    fn name(&self) -> &'static str {
        BlockInstance::name(self)
    }

    fn phase(&self) -> Phase {
        BlockInstance::phase(self)
    }

    fn ticks_per_s(&self) -> u8 {
        self.config().ticks_per_s()
    }

    fn init(&mut self) -> Result<()> {
        BlockInstance::init(self)
    }

    fn tick(&mut self) -> Result<()> {
        BlockInstance::tick(self)
    }

    fn accepts(&self, id: Id) -> bool {
        BlockInstance::accepts(self, id)
    }

    fn route_frame(&mut self, id: Id, payload: &[u8]) -> Result<bool> {
        BlockInstance::route_frame(self, id, payload)
    }

    fn input_descriptor(&self, name: &str) -> Option<&'static FieldDescriptor> {
        B::Inputs::descriptor(name)
    }

    fn output_descriptor(&self, name: &str) -> Option<&'static FieldDescriptor> {
        B::Outputs::descriptor(name)
    }

    fn set_input(&mut self, name: &str, value: FieldValue) -> Result<()> {
        BlockInstance::set_input(self, name, value)
    }

    fn output(&self, name: &str) -> Option<FieldValue> {
        BlockInstance::output(self, name)
    }

    fn output_fields(&self) -> &'static [FieldDescriptor] {
        B::Outputs::FIELDS
    }
}

// ───────────────────────────────────────────────────────────────
// Registry
// ───────────────────────────────────────────────────────────────

/// Index of a block inside its [`Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockHandle(usize);

struct Slot {
    block: Box<dyn DynBlock>,
    /// Set once the block has initialised.
    divider: Option<RateDivider>,
}

#[derive(Debug, Clone, Copy)]
struct Link {
    from: usize,
    output: &'static str,
    to: usize,
    input: &'static str,
}

pub struct Registry {
    base_hz: u32,
    slots: Vec<Slot>,
    links: Vec<Link>,
}

impl Registry {
    /// Registry stepped at `base_hz` base periods per second.
    pub fn new(base_hz: u32) -> Self {
        Self {
            base_hz: base_hz.max(1),
            slots: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn base_hz(&self) -> u32 {
        self.base_hz
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn add<B: Block + 'static>(&mut self, instance: BlockInstance<B>) -> BlockHandle {
        self.slots.push(Slot {
            block: Box::new(instance),
            divider: None,
        });
        BlockHandle(self.slots.len() - 1)
    }

    pub fn find(&self, name: &str) -> Option<BlockHandle> {
        self.slots
            .iter()
            .position(|s| s.block.name() == name)
            .map(BlockHandle)
    }

    pub fn block(&self, handle: BlockHandle) -> &dyn DynBlock {
        self.slots[handle.0].block.as_ref()
    }

    pub fn block_mut(&mut self, handle: BlockHandle) -> &mut dyn DynBlock {
        self.slots[handle.0].block.as_mut()
    }

    pub fn output(&self, handle: BlockHandle, name: &str) -> Option<FieldValue> {
        self.block(handle).output(name)
    }

    pub fn set_input(&mut self, handle: BlockHandle, name: &str, value: FieldValue) -> Result<()> {
        self.block_mut(handle).set_input(name, value)
    }

    /// Feed `from.output` into `to.input` before every step.
    ///
    /// Both fields must exist and have the same type.
    pub fn link(
        &mut self,
        from: BlockHandle,
        output: &str,
        to: BlockHandle,
        input: &str,
    ) -> Result<()> {
        let out = self
            .block(from)
            .output_descriptor(output)
            .ok_or(FieldError::UnknownField)?;
        let inp = self
            .block(to)
            .input_descriptor(input)
            .ok_or(FieldError::UnknownField)?;
        if out.ty != inp.ty {
            return Err(FieldError::TypeMismatch.into());
        }
        info!(
            "Link {}.{} -> {}.{}",
            self.block(from).name(),
            out.name,
            self.block(to).name(),
            inp.name
        );
        self.links.push(Link {
            from: from.0,
            output: out.name,
            to: to.0,
            input: inp.name,
        });
        Ok(())
    }

    /// Initialise every block.  Returns how many are ready to run; the
    /// rest never run.
    ///
    /// Blocks added already initialised (e.g. to overlay a stored config
    /// first) are scheduled without a second `init`.
    pub fn init_all(&mut self, sink: &mut impl EventSink) -> usize {
        let mut ok = 0;
        for slot in &mut self.slots {
            let name = slot.block.name();
            if slot.divider.is_some() {
                ok += 1;
                continue;
            }
            let result = match slot.block.phase() {
                Phase::Uninitialized => slot.block.init(),
                Phase::Ready | Phase::Running => Ok(()),
            };
            match result {
                Ok(()) => {
                    let ticks_per_s = slot.block.ticks_per_s();
                    slot.divider = Some(RateDivider::new(self.base_hz, ticks_per_s));
                    sink.emit(&HostEvent::Initialized {
                        block: name,
                        ticks_per_s,
                    });
                    ok += 1;
                }
                Err(error) => {
                    sink.emit(&HostEvent::InitFailed { block: name, error });
                }
            }
        }
        ok
    }

    /// Run one base period.
    pub fn step(&mut self, sink: &mut impl EventSink) {
        for i in 0..self.links.len() {
            let link = self.links[i];
            if let Err(error) = self.apply_link(link) {
                sink.emit(&HostEvent::LinkFailed {
                    from: self.slots[link.from].block.name(),
                    to: self.slots[link.to].block.name(),
                    error,
                });
            }
        }

        for slot in &mut self.slots {
            let Some(divider) = slot.divider.as_mut() else {
                continue;
            };
            if divider.step() {
                if let Err(e) = slot.block.tick() {
                    warn!("Block '{}' tick failed: {}", slot.block.name(), e);
                }
            }
        }
    }

    fn apply_link(&mut self, link: Link) -> Result<()> {
        let value = self.slots[link.from]
            .block
            .output(link.output)
            .ok_or(Error::Field(FieldError::UnknownField))?;
        self.slots[link.to].block.set_input(link.input, value)
    }

    /// Deliver a received frame to every block that accepts its id.
    ///
    /// Returns the number of blocks that decoded it.
    pub fn dispatch_frame(&mut self, frame: &CanFrame, sink: &mut impl EventSink) -> usize {
        let id = frame.id();
        let mut takers = 0;
        let mut decoded = 0;
        for slot in &mut self.slots {
            if slot.divider.is_none() || !slot.block.accepts(id) {
                continue;
            }
            takers += 1;
            match slot.block.route_frame(id, frame.data()) {
                Ok(true) => decoded += 1,
                Ok(false) => {}
                Err(Error::Decode(error)) => sink.emit(&HostEvent::FrameRejected {
                    block: slot.block.name(),
                    id: raw_id(id),
                    error,
                }),
                Err(e) => warn!("Block '{}' frame failed: {}", slot.block.name(), e),
            }
        }
        if takers == 0 {
            sink.emit(&HostEvent::FrameUnclaimed { id: raw_id(id) });
        }
        decoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::log_sink::RecordingSink;
    use crate::blocks::example::ExampleBlock;
    use crate::blocks::scale::ScaleBlock;
    use crate::error::ConfigError;
    use embedded_can::StandardId;

    fn frame(raw: u16, data: &[u8]) -> CanFrame {
        CanFrame::new(Id::Standard(StandardId::new(raw).unwrap()), data).unwrap()
    }

    #[test]
    fn link_validates_names_and_types() {
        let mut reg = Registry::new(100);
        let ex = reg.add(BlockInstance::new_can(ExampleBlock));
        let sc = reg.add(BlockInstance::new(ScaleBlock));

        assert!(reg.link(ex, "outputs_float", sc, "input").is_ok());
        assert_eq!(
            reg.link(ex, "outputs_uint8", sc, "input"),
            Err(FieldError::TypeMismatch.into())
        );
        assert_eq!(
            reg.link(ex, "nope", sc, "input"),
            Err(FieldError::UnknownField.into())
        );
    }

    #[test]
    fn step_propagates_links_before_ticking() {
        let mut reg = Registry::new(100);
        let mut sink = RecordingSink::default();
        let ex = reg.add(BlockInstance::new_can(ExampleBlock));
        let sc = reg.add(BlockInstance::new(ScaleBlock));
        reg.link(ex, "outputs_float", sc, "input").unwrap();
        assert_eq!(reg.init_all(&mut sink), 2);
        assert_eq!(sink.events.len(), 2);

        reg.set_input(ex, "inputs_uint8", FieldValue::U8(3)).unwrap();
        // First step: the link copies the pre-tick output (0.0).
        reg.step(&mut sink);
        assert_eq!(reg.output(sc, "value"), Some(FieldValue::F32(0.0)));
        assert_eq!(reg.find("scale"), Some(sc));
    }

    #[test]
    fn dispatch_counts_and_reports() {
        let mut reg = Registry::new(100);
        let mut sink = RecordingSink::default();
        let ex = reg.add(BlockInstance::new_can(ExampleBlock));
        reg.add(BlockInstance::new(ScaleBlock));

        // Not initialised yet: nobody takes it.
        assert_eq!(reg.dispatch_frame(&frame(0x10, &[5]), &mut sink), 0);
        assert_eq!(sink.events, [HostEvent::FrameUnclaimed { id: 0x10 }]);

        reg.init_all(&mut sink);
        sink.events.clear();
        assert_eq!(reg.dispatch_frame(&frame(0x10, &[5]), &mut sink), 1);
        assert_eq!(reg.output(ex, "outputs_uint8"), Some(FieldValue::U8(5)));

        assert_eq!(reg.dispatch_frame(&frame(0x10, &[]), &mut sink), 0);
        assert!(matches!(
            sink.events.as_slice(),
            [HostEvent::FrameRejected { block: "example_block", id: 0x10, .. }]
        ));
    }

    #[test]
    fn divider_sets_block_rate() {
        let mut reg = Registry::new(1000);
        let mut sink = RecordingSink::default();
        let ex = reg.add(BlockInstance::new_can(ExampleBlock));
        reg.init_all(&mut sink);
        for _ in 0..1000 {
            reg.step(&mut sink);
        }
        // 100 ticks/s on a 1 kHz base.
        assert_eq!(reg.block(ex).phase(), Phase::Running);
        assert_eq!(reg.output(ex, "outputs_uint8"), Some(FieldValue::U8(1)));
    }

    #[test]
    fn pre_initialised_blocks_are_scheduled() {
        let mut reg = Registry::new(100);
        let mut sink = RecordingSink::default();
        let mut inst = BlockInstance::new_can(ExampleBlock);
        inst.init().unwrap();
        inst.configure(|c| c.config_uint8 = 9).unwrap();
        let ex = reg.add(inst);
        assert_eq!(reg.init_all(&mut sink), 1);
        assert_eq!(reg.init_all(&mut sink), 1);
        assert_eq!(sink.events.len(), 1);
        reg.step(&mut sink);
        assert_eq!(reg.output(ex, "outputs_uint8"), Some(FieldValue::U8(9)));
    }

    struct Broken;

    impl Block for Broken {
        const NAME: &'static str = "broken";
        type Inputs = crate::blocks::scale::ScaleInputs;
        type Outputs = crate::blocks::scale::ScaleOutputs;
        type Internal = ();
        type Config = crate::blocks::scale::ScaleConfig;

        fn init(&self, _ctx: crate::block::InitContext<'_, Self>) -> Result<()> {
            // Leaves ticks_per_s at zero.
            Ok(())
        }

        fn tick(&self, _ctx: crate::block::TickContext<'_, Self>) {}
    }

    #[test]
    fn failed_init_is_reported_and_skipped() {
        let mut reg = Registry::new(100);
        let mut sink = RecordingSink::default();
        let b = reg.add(BlockInstance::new(Broken));
        assert_eq!(reg.init_all(&mut sink), 0);
        assert!(matches!(
            sink.events.as_slice(),
            [HostEvent::InitFailed {
                block: "broken",
                error: Error::Config(ConfigError::ValidationFailed(_))
            }]
        ));
        reg.step(&mut sink);
        assert_eq!(reg.block(b).phase(), Phase::Uninitialized);
    }
}
