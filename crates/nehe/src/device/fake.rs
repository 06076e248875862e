//! Recording backend for tests.
//!
//! Every call is appended to a shared journal; handles are plain integers.
//! Clones share state, so a test can keep one clone as a probe after the
//! backend has been moved into a `Context`.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use crate::coords::Size;
use crate::error::{NeHeError, Result};

use super::{
    BufferDesc, BufferUsage, GpuBackend, ShaderDesc, ShaderFormats, ShaderStage, SwapchainImage,
    TextureDesc, TextureFormat, TextureUsage,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    CreateBuffer { id: u32, usage: BufferUsage, size: u32 },
    ReleaseBuffer(u32),
    CreateTexture {
        id: u32,
        format: TextureFormat,
        usage: TextureUsage,
        size: Size<u32>,
        mip_levels: u32,
        clear_depth: Option<f32>,
    },
    ReleaseTexture(u32),
    CreateTransfer { id: u32, size: u32 },
    WriteTransfer { id: u32, data: Vec<u8> },
    ReleaseTransfer(u32),
    CreateShader {
        id: u32,
        format: ShaderFormats,
        stage: ShaderStage,
        entry_point: String,
        code: Vec<u8>,
        samplers: u32,
        storage_buffers: u32,
        uniform_buffers: u32,
    },
    ReleaseShader(u32),
    AcquireCommandBuffer(u32),
    BeginCopyPass(u32),
    UploadBuffer { cmd: u32, transfer: u32, buffer: u32, size: u32 },
    UploadTexture { cmd: u32, transfer: u32, texture: u32, size: Size<u32>, row_pitch: u32 },
    EndCopyPass(u32),
    GenerateMipmaps { cmd: u32, texture: u32 },
    AcquireSwapchain(u32),
    Submit(u32),
    Cancel(u32),
}

/// Scripted outcome of the next swapchain acquisition.
#[derive(Debug, Copy, Clone)]
pub(crate) enum Swapchain {
    Image(Size<u32>),
    Unavailable,
    Fail,
}

struct State {
    next_id: u32,
    calls: Vec<Call>,
    failing: HashSet<&'static str>,
    fail_after: HashMap<&'static str, u32>,
    swapchain: VecDeque<Swapchain>,
    swapchain_size: Size<u32>,
    live_textures: HashSet<u32>,
    max_live_textures: usize,
    formats: ShaderFormats,
    row_alignment: u32,
}

#[derive(Clone)]
pub(crate) struct FakeBackend {
    state: Rc<RefCell<State>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                next_id: 1,
                calls: Vec::new(),
                failing: HashSet::new(),
                fail_after: HashMap::new(),
                swapchain: VecDeque::new(),
                swapchain_size: Size::new(640, 480),
                live_textures: HashSet::new(),
                max_live_textures: 0,
                formats: ShaderFormats::WGSL | ShaderFormats::SPIRV,
                row_alignment: 1,
            })),
        }
    }

    pub fn with_shader_formats(self, formats: ShaderFormats) -> Self {
        self.state.borrow_mut().formats = formats;
        self
    }

    /// Pads texture rows to a multiple of `alignment` bytes.
    pub fn with_row_alignment(self, alignment: u32) -> Self {
        self.state.borrow_mut().row_alignment = alignment;
        self
    }

    /// Makes every later call to `operation` fail.
    pub fn fail_on(&self, operation: &'static str) {
        self.state.borrow_mut().failing.insert(operation);
    }

    /// Lets `successes` more calls to `operation` through, then fails the rest.
    pub fn fail_after(&self, operation: &'static str, successes: u32) {
        self.state.borrow_mut().fail_after.insert(operation, successes);
    }

    pub fn recover(&self, operation: &'static str) {
        let mut state = self.state.borrow_mut();
        state.failing.remove(operation);
        state.fail_after.remove(operation);
    }

    /// Size reported by acquisitions with no scripted outcome.
    pub fn set_swapchain_size(&self, size: Size<u32>) {
        self.state.borrow_mut().swapchain_size = size;
    }

    pub fn push_swapchain(&self, outcome: Swapchain) {
        self.state.borrow_mut().swapchain.push_back(outcome);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn live_textures(&self) -> usize {
        self.state.borrow().live_textures.len()
    }

    /// Highest number of textures alive at the same time.
    pub fn max_live_textures(&self) -> usize {
        self.state.borrow().max_live_textures
    }

    fn check(&self, operation: &'static str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if let Some(remaining) = state.fail_after.get_mut(operation) {
            if *remaining == 0 {
                return Err(NeHeError::backend(operation, "injected failure"));
            }
            *remaining -= 1;
        }
        if state.failing.contains(operation) {
            return Err(NeHeError::backend(operation, "injected failure"));
        }
        Ok(())
    }

    fn allocate(&self) -> u32 {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        id
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl GpuBackend for FakeBackend {
    type Buffer = u32;
    type Texture = u32;
    type TransferBuffer = u32;
    type Shader = u32;
    type CommandBuffer = u32;
    type SwapchainTexture = u32;

    fn shader_formats(&self) -> ShaderFormats {
        self.state.borrow().formats
    }

    fn create_buffer(&self, desc: &BufferDesc) -> Result<u32> {
        self.check("create_buffer")?;
        let id = self.allocate();
        self.record(Call::CreateBuffer { id, usage: desc.usage, size: desc.size });
        Ok(id)
    }

    fn release_buffer(&self, buffer: u32) {
        self.record(Call::ReleaseBuffer(buffer));
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<u32> {
        self.check("create_texture")?;
        let id = self.allocate();
        self.record(Call::CreateTexture {
            id,
            format: desc.format,
            usage: desc.usage,
            size: desc.size,
            mip_levels: desc.mip_levels,
            clear_depth: desc.clear_depth,
        });
        let mut state = self.state.borrow_mut();
        state.live_textures.insert(id);
        state.max_live_textures = state.max_live_textures.max(state.live_textures.len());
        Ok(id)
    }

    fn release_texture(&self, texture: u32) {
        self.record(Call::ReleaseTexture(texture));
        self.state.borrow_mut().live_textures.remove(&texture);
    }

    fn create_transfer_buffer(&self, size: u32) -> Result<u32> {
        self.check("create_transfer_buffer")?;
        let id = self.allocate();
        self.record(Call::CreateTransfer { id, size });
        Ok(id)
    }

    fn write_transfer_buffer(&self, transfer: &mut u32, data: &[u8]) -> Result<()> {
        self.check("map_transfer_buffer")?;
        self.record(Call::WriteTransfer { id: *transfer, data: data.to_vec() });
        Ok(())
    }

    fn release_transfer_buffer(&self, transfer: u32) {
        self.record(Call::ReleaseTransfer(transfer));
    }

    fn texture_row_pitch(&self, format: TextureFormat, width: u32) -> u32 {
        let tight = width * format.bytes_per_texel().unwrap_or(0);
        tight.next_multiple_of(self.state.borrow().row_alignment)
    }

    fn create_shader(&self, desc: &ShaderDesc<'_>) -> Result<u32> {
        self.check("create_shader")?;
        let id = self.allocate();
        self.record(Call::CreateShader {
            id,
            format: desc.format,
            stage: desc.stage,
            entry_point: desc.entry_point.to_owned(),
            code: desc.code.to_vec(),
            samplers: desc.num_samplers,
            storage_buffers: desc.num_storage_buffers,
            uniform_buffers: desc.num_uniform_buffers,
        });
        Ok(id)
    }

    fn release_shader(&self, shader: u32) {
        self.record(Call::ReleaseShader(shader));
    }

    fn acquire_command_buffer(&self) -> Result<u32> {
        self.check("acquire_command_buffer")?;
        let id = self.allocate();
        self.record(Call::AcquireCommandBuffer(id));
        Ok(id)
    }

    fn begin_copy_pass(&self, cmd: &mut u32) {
        self.record(Call::BeginCopyPass(*cmd));
    }

    fn upload_to_buffer(&self, cmd: &mut u32, source: &u32, destination: &u32, size: u32) {
        self.record(Call::UploadBuffer { cmd: *cmd, transfer: *source, buffer: *destination, size });
    }

    fn upload_to_texture(
        &self,
        cmd: &mut u32,
        source: &u32,
        destination: &u32,
        size: Size<u32>,
        row_pitch: u32,
    ) {
        self.record(Call::UploadTexture {
            cmd: *cmd,
            transfer: *source,
            texture: *destination,
            size,
            row_pitch,
        });
    }

    fn end_copy_pass(&self, cmd: &mut u32) {
        self.record(Call::EndCopyPass(*cmd));
    }

    fn generate_mipmaps(&self, cmd: &mut u32, texture: &u32) {
        self.record(Call::GenerateMipmaps { cmd: *cmd, texture: *texture });
    }

    fn acquire_swapchain_texture(&mut self, cmd: &mut u32) -> Result<Option<SwapchainImage<u32>>> {
        self.record(Call::AcquireSwapchain(*cmd));
        let outcome = {
            let mut state = self.state.borrow_mut();
            let fallback = Swapchain::Image(state.swapchain_size);
            state.swapchain.pop_front().unwrap_or(fallback)
        };
        match outcome {
            Swapchain::Image(size) => Ok(Some(SwapchainImage { texture: 0, size })),
            Swapchain::Unavailable => Ok(None),
            Swapchain::Fail => Err(NeHeError::backend("acquire_swapchain_texture", "device lost")),
        }
    }

    fn submit(&self, cmd: u32) {
        self.record(Call::Submit(cmd));
    }

    fn cancel(&self, cmd: u32) {
        self.record(Call::Cancel(cmd));
    }
}
