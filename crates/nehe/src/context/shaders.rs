use crate::assets::AssetBundle;
use crate::device::{GpuBackend, ShaderDesc, ShaderFormats, ShaderStage};
use crate::error::{NeHeError, Result};

use super::Context;

/// Vertex and fragment stage of one lesson program.
pub struct ShaderPair<S> {
    pub vertex: S,
    pub fragment: S,
}

struct StageFile {
    extension: &'static str,
    entry_point: &'static str,
}

struct Probe {
    format: ShaderFormats,
    vertex: StageFile,
    fragment: StageFile,
}

const fn probe(
    format: ShaderFormats,
    vertex: (&'static str, &'static str),
    fragment: (&'static str, &'static str),
) -> Probe {
    Probe {
        format,
        vertex: StageFile { extension: vertex.0, entry_point: vertex.1 },
        fragment: StageFile { extension: fragment.0, entry_point: fragment.1 },
    }
}

/// Native library first, then source languages, then bytecode.
const PROBE_ORDER: [Probe; 5] = [
    probe(ShaderFormats::METALLIB, ("metallib", "VertexMain"), ("metallib", "FragmentMain")),
    probe(ShaderFormats::MSL, ("metal", "VertexMain"), ("metal", "FragmentMain")),
    probe(ShaderFormats::WGSL, ("wgsl", "VertexMain"), ("wgsl", "FragmentMain")),
    probe(ShaderFormats::SPIRV, ("vtx.spv", "VertexMain"), ("frg.spv", "FragmentMain")),
    probe(ShaderFormats::DXIL, ("vtx.dxb", "VertexMain"), ("pxl.dxb", "PixelMain")),
];

/// Reads one stage file, mapping "missing" to `None`.
fn read_optional(bundle: &dyn AssetBundle, path: &str, extension: &str) -> Result<Option<Vec<u8>>> {
    match bundle.load(path, extension) {
        Ok(code) => Ok(Some(code)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

impl<B: GpuBackend> Context<B> {
    /// Loads the vertex/fragment pair `Shaders/<name>` in the first format
    /// the device advertises and the bundle provides.
    pub fn load_shaders(
        &self,
        name: &str,
        vertex_uniforms: u32,
        vertex_storage: u32,
        fragment_samplers: u32,
    ) -> Result<ShaderPair<B::Shader>> {
        let bundle = self.bundle()?;
        let available = self.backend().shader_formats();
        let path = format!("Shaders/{name}");

        for probe in PROBE_ORDER.iter().filter(|p| available.contains(p.format)) {
            let Some(vertex_code) = read_optional(bundle, &path, probe.vertex.extension)? else {
                continue;
            };
            let fragment_code = if probe.fragment.extension == probe.vertex.extension {
                vertex_code.clone()
            } else {
                match read_optional(bundle, &path, probe.fragment.extension)? {
                    Some(code) => code,
                    None => continue,
                }
            };

            log::debug!("loading shader '{name}' as {:?}", probe.format);

            let vertex = self.backend().create_shader(&ShaderDesc {
                code: &vertex_code,
                entry_point: probe.vertex.entry_point,
                format: probe.format,
                stage: ShaderStage::Vertex,
                num_samplers: 0,
                num_storage_buffers: vertex_storage,
                num_uniform_buffers: vertex_uniforms,
            })?;
            let fragment = match self.backend().create_shader(&ShaderDesc {
                code: &fragment_code,
                entry_point: probe.fragment.entry_point,
                format: probe.format,
                stage: ShaderStage::Fragment,
                num_samplers: fragment_samplers,
                num_storage_buffers: 0,
                num_uniform_buffers: 0,
            }) {
                Ok(fragment) => fragment,
                Err(err) => {
                    self.backend().release_shader(vertex);
                    return Err(err);
                }
            };

            return Ok(ShaderPair { vertex, fragment });
        }

        Err(NeHeError::Fatal("no supported shader formats"))
    }
}
