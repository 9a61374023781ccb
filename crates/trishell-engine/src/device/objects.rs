use std::collections::HashMap;

use crate::platform::{
    GpuId, IdAllocator, PlatformError, ShaderDesc, ShaderStage, VertexAttribute,
};

/// Shader inputs fed from one vertex buffer.
#[derive(Debug, Default)]
pub(crate) struct VertexArray {
    pub buffer: Option<GpuId>,
    pub stride: u64,
    pub attributes: Vec<wgpu::VertexAttribute>,
}

impl VertexArray {
    /// Adds or replaces the attribute at `attribute.location`.
    fn set_attribute(&mut self, buffer: GpuId, attribute: VertexAttribute) {
        self.buffer = Some(buffer);
        self.stride = attribute.stride;
        self.attributes
            .retain(|a| a.shader_location != attribute.location);
        self.attributes.push(wgpu::VertexAttribute {
            format: attribute.format.to_wgpu(),
            offset: attribute.offset,
            shader_location: attribute.location,
        });
        self.attributes.sort_by_key(|a| a.shader_location);
    }

    pub fn layout(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Shader {
    pub stage: ShaderStage,
    pub module: wgpu::ShaderModule,
    pub entry_point: String,
}

/// A linked vertex + fragment pair.
///
/// Holds its own module handles so the source shaders can be deleted right
/// after linking.
#[derive(Debug)]
pub(crate) struct Program {
    pub vertex: Shader,
    pub fragment: Shader,
}

#[derive(Debug)]
pub(crate) enum GpuObject {
    VertexArray(VertexArray),
    Buffer(wgpu::Buffer),
    Shader(Shader),
    Program(Program),
}

impl GpuObject {
    fn kind(&self) -> &'static str {
        match self {
            Self::VertexArray(_) => "vertex array",
            Self::Buffer(_) => "buffer",
            Self::Shader(_) => "shader",
            Self::Program(_) => "program",
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct PipelineKey {
    program: GpuId,
    vertex_array: GpuId,
    format: wgpu::TextureFormat,
}

/// Every GPU object of the current context, by id.
///
/// Render pipelines are derived state: one per (program, vertex array,
/// surface format), built as soon as both inputs exist and dropped when either
/// goes.
#[derive(Default)]
pub(crate) struct ObjectRegistry {
    ids: IdAllocator,
    objects: HashMap<GpuId, GpuObject>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl ObjectRegistry {
    pub fn insert(&mut self, object: GpuObject) -> GpuId {
        let id = GpuId::new(self.ids.next());
        log::trace!("created {} {id}", object.kind());
        self.objects.insert(id, object);
        id
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn shader(&self, id: GpuId) -> Result<&Shader, PlatformError> {
        match self.objects.get(&id) {
            Some(GpuObject::Shader(s)) => Ok(s),
            _ => Err(PlatformError::UnknownObject(id)),
        }
    }

    pub fn buffer(&self, id: GpuId) -> Option<&wgpu::Buffer> {
        match self.objects.get(&id) {
            Some(GpuObject::Buffer(b)) => Some(b),
            _ => None,
        }
    }

    pub fn vertex_array(&self, id: GpuId) -> Option<&VertexArray> {
        match self.objects.get(&id) {
            Some(GpuObject::VertexArray(v)) => Some(v),
            _ => None,
        }
    }

    pub fn set_attribute(
        &mut self,
        vertex_array: GpuId,
        buffer: GpuId,
        attribute: VertexAttribute,
    ) -> Result<(), PlatformError> {
        if self.buffer(buffer).is_none() {
            return Err(PlatformError::UnknownObject(buffer));
        }
        let Some(GpuObject::VertexArray(vao)) = self.objects.get_mut(&vertex_array) else {
            return Err(PlatformError::UnknownObject(vertex_array));
        };

        vao.set_attribute(buffer, attribute);
        self.pipelines.retain(|k, _| k.vertex_array != vertex_array);
        Ok(())
    }

    /// Removes `id` if it names an object of the kind `matches` accepts.
    ///
    /// Unknown ids and kind mismatches are ignored.
    pub fn remove(&mut self, id: GpuId, matches: fn(&GpuObject) -> bool) {
        match self.objects.get(&id) {
            Some(object) if matches(object) => {
                log::trace!("deleted {} {id}", object.kind());
                self.objects.remove(&id);
                self.pipelines
                    .retain(|k, _| k.program != id && k.vertex_array != id);
            }
            Some(object) => {
                log::debug!("ignoring delete of {id}: it is a {}", object.kind());
            }
            None => log::debug!("ignoring delete of unknown {id}"),
        }
    }

    /// Drops every object. Used when the owning context goes away.
    pub fn clear(&mut self) {
        self.pipelines.clear();
        self.objects.clear();
    }

    /// Builds the pipeline for `program` drawing from `vertex_array` unless it
    /// is already cached.
    pub fn ensure_pipeline(
        &mut self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        program: GpuId,
        vertex_array: GpuId,
    ) -> Result<(), PlatformError> {
        let key = PipelineKey {
            program,
            vertex_array,
            format,
        };
        if self.pipelines.contains_key(&key) {
            return Ok(());
        }

        let Some(GpuObject::Program(prog)) = self.objects.get(&program) else {
            return Err(PlatformError::UnknownObject(program));
        };
        let vao = self
            .vertex_array(vertex_array)
            .ok_or(PlatformError::UnknownObject(vertex_array))?;

        let pipeline = build_pipeline(device, format, prog, vao).map_err(|err| {
            PlatformError::Link(format!("{program} cannot draw from {vertex_array}: {err}"))
        })?;
        self.pipelines.insert(key, pipeline);
        Ok(())
    }

    /// Builds `program` against every vertex array that feeds shader inputs.
    pub fn link_against_vertex_arrays(
        &mut self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        program: GpuId,
    ) -> Result<(), PlatformError> {
        let arrays = self.ids_where(|o| {
            matches!(o, GpuObject::VertexArray(v) if !v.attributes.is_empty())
        });
        for vertex_array in arrays {
            self.ensure_pipeline(device, format, program, vertex_array)?;
        }
        Ok(())
    }

    /// Builds every linked program against `vertex_array`.
    pub fn link_against_programs(
        &mut self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        vertex_array: GpuId,
    ) -> Result<(), PlatformError> {
        for program in self.ids_where(|o| matches!(o, GpuObject::Program(_))) {
            self.ensure_pipeline(device, format, program, vertex_array)?;
        }
        Ok(())
    }

    fn ids_where(&self, pred: fn(&GpuObject) -> bool) -> Vec<GpuId> {
        self.objects
            .iter()
            .filter(|(_, object)| pred(object))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn pipeline(
        &self,
        format: wgpu::TextureFormat,
        program: GpuId,
        vertex_array: GpuId,
    ) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(&PipelineKey {
            program,
            vertex_array,
            format,
        })
    }
}

/// Runs `f` inside a validation error scope.
///
/// Validation errors raised by `f` come back as `Err` instead of reaching the
/// device's uncaptured-error handler, which panics by default.
fn validated<T>(device: &wgpu::Device, f: impl FnOnce() -> T) -> Result<T, wgpu::Error> {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = f();
    match pollster::block_on(scope.pop()) {
        Some(err) => Err(err),
        None => Ok(value),
    }
}

/// Compiles one WGSL stage.
pub(crate) fn compile_shader(
    device: &wgpu::Device,
    desc: &ShaderDesc<'_>,
) -> Result<Shader, PlatformError> {
    let module = validated(device, || {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Wgsl(desc.source.into()),
        })
    })
    .map_err(|err| PlatformError::Shader(format!("{}: {err}", desc.label)))?;

    let info = pollster::block_on(module.get_compilation_info());
    let mut errors = Vec::new();
    for message in &info.messages {
        match message.message_type {
            wgpu::CompilationMessageType::Error => errors.push(message.message.clone()),
            wgpu::CompilationMessageType::Warning => {
                log::warn!("{}: {}", desc.label, message.message)
            }
            _ => log::debug!("{}: {}", desc.label, message.message),
        }
    }
    if !errors.is_empty() {
        return Err(PlatformError::Shader(format!(
            "{}: {}",
            desc.label,
            errors.join("; ")
        )));
    }

    Ok(Shader {
        stage: desc.stage,
        module,
        entry_point: desc.entry_point.to_string(),
    })
}

fn build_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    program: &Program,
    vao: &VertexArray,
) -> Result<wgpu::RenderPipeline, wgpu::Error> {
    validated(device, || create_pipeline(device, format, program, vao))
}

fn create_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    program: &Program,
    vao: &VertexArray,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("trishell pipeline layout"),
        bind_group_layouts: &[],
        immediate_size: 0,
    });

    // A vertex array with no attributes still draws, from vertex_index alone.
    let buffers = if vao.attributes.is_empty() {
        Vec::new()
    } else {
        vec![vao.layout()]
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("trishell pipeline"),
        layout: Some(&layout),

        vertex: wgpu::VertexState {
            module: &program.vertex.module,
            entry_point: Some(program.vertex.entry_point.as_str()),
            compilation_options: Default::default(),
            buffers: &buffers,
        },

        fragment: Some(wgpu::FragmentState {
            module: &program.fragment.module,
            entry_point: Some(program.fragment.entry_point.as_str()),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::AttributeFormat;
    use crate::render::triangle::{FRAGMENT_SHADER, POSITION_ATTRIBUTE, VERTEX_SHADER};

    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    /// Headless device, or `None` on machines without a usable adapter.
    fn headless_device() -> Option<wgpu::Device> {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions::default())
                .await
                .ok()?;
            let (device, _queue) = adapter
                .request_device(&wgpu::DeviceDescriptor {
                    required_limits: wgpu::Limits::downlevel_defaults(),
                    ..Default::default()
                })
                .await
                .ok()?;
            Some(device)
        })
    }

    /// Registry holding the triangle's vertex array fed from a real buffer.
    fn registry_with_geometry(device: &wgpu::Device) -> (ObjectRegistry, GpuId) {
        let mut reg = ObjectRegistry::default();
        let buffer = reg.insert(GpuObject::Buffer(device.create_buffer(
            &wgpu::BufferDescriptor {
                label: None,
                size: 24,
                usage: wgpu::BufferUsages::VERTEX,
                mapped_at_creation: false,
            },
        )));
        let vao = reg.insert(GpuObject::VertexArray(VertexArray::default()));
        reg.set_attribute(vao, buffer, POSITION_ATTRIBUTE).unwrap();
        (reg, vao)
    }

    fn program(device: &wgpu::Device, fragment: &ShaderDesc<'_>) -> Program {
        Program {
            vertex: compile_shader(device, &VERTEX_SHADER).unwrap(),
            fragment: compile_shader(device, fragment).unwrap(),
        }
    }

    #[test]
    fn malformed_wgsl_is_a_shader_error() {
        let Some(device) = headless_device() else {
            return;
        };
        let broken = ShaderDesc {
            label: "broken.frag",
            stage: ShaderStage::Fragment,
            source: "@fragment fn fs_main( -> @location(0) vec4<f32> {",
            entry_point: "fs_main",
        };

        let err = compile_shader(&device, &broken).unwrap_err();
        assert!(matches!(&err, PlatformError::Shader(m) if m.starts_with("broken.frag")));
    }

    #[test]
    fn triangle_program_links_against_its_geometry() {
        let Some(device) = headless_device() else {
            return;
        };
        let (mut reg, vao) = registry_with_geometry(&device);
        let prog = reg.insert(GpuObject::Program(program(&device, &FRAGMENT_SHADER)));

        reg.link_against_vertex_arrays(&device, FORMAT, prog).unwrap();
        assert!(reg.pipeline(FORMAT, prog, vao).is_some());
    }

    #[test]
    fn unfed_fragment_input_fails_the_link() {
        let Some(device) = headless_device() else {
            return;
        };
        let (mut reg, vao) = registry_with_geometry(&device);
        let needs_input = ShaderDesc {
            label: "varying.frag",
            stage: ShaderStage::Fragment,
            source: "@fragment fn fs_main(@location(3) v: vec4<f32>) -> @location(0) vec4<f32> { return v; }",
            entry_point: "fs_main",
        };
        let prog = reg.insert(GpuObject::Program(program(&device, &needs_input)));

        let err = reg
            .link_against_vertex_arrays(&device, FORMAT, prog)
            .unwrap_err();
        assert!(matches!(err, PlatformError::Link(_)));
        assert!(reg.pipeline(FORMAT, prog, vao).is_none());

        // Setting attributes later re-checks the programs already linked.
        let err = reg
            .link_against_programs(&device, FORMAT, vao)
            .unwrap_err();
        assert!(matches!(err, PlatformError::Link(_)));
    }

    #[test]
    fn attribute_replaces_same_location() {
        let mut ids = IdAllocator::new();
        let buffer = GpuId::new(ids.next());
        let mut vao = VertexArray::default();

        vao.set_attribute(buffer, VertexAttribute::packed(0, AttributeFormat::Float32x3));
        vao.set_attribute(buffer, VertexAttribute::packed(0, AttributeFormat::Float32x2));

        assert_eq!(vao.attributes.len(), 1);
        assert_eq!(vao.attributes[0].format, wgpu::VertexFormat::Float32x2);
        assert_eq!(vao.stride, 8);
        assert_eq!(vao.buffer, Some(buffer));
    }

    #[test]
    fn attributes_stay_sorted_by_location() {
        let mut ids = IdAllocator::new();
        let buffer = GpuId::new(ids.next());
        let mut vao = VertexArray::default();

        vao.set_attribute(buffer, VertexAttribute::packed(3, AttributeFormat::Float32x4));
        vao.set_attribute(buffer, VertexAttribute::packed(1, AttributeFormat::Float32x2));

        let locations: Vec<u32> = vao.attributes.iter().map(|a| a.shader_location).collect();
        assert_eq!(locations, vec![1, 3]);
    }

    #[test]
    fn attribute_on_unknown_objects_fails() {
        let mut reg = ObjectRegistry::default();
        let vao = reg.insert(GpuObject::VertexArray(VertexArray::default()));

        let bogus = GpuId::new(std::num::NonZeroU32::new(99).unwrap());
        let err = reg
            .set_attribute(vao, bogus, VertexAttribute::packed(0, AttributeFormat::Float32x2))
            .unwrap_err();
        assert!(matches!(err, PlatformError::UnknownObject(id) if id == bogus));
    }

    #[test]
    fn remove_checks_kind_and_is_idempotent() {
        let mut reg = ObjectRegistry::default();
        let vao = reg.insert(GpuObject::VertexArray(VertexArray::default()));

        reg.remove(vao, |o| matches!(o, GpuObject::Program(_)));
        assert_eq!(reg.len(), 1);

        reg.remove(vao, |o| matches!(o, GpuObject::VertexArray(_)));
        reg.remove(vao, |o| matches!(o, GpuObject::VertexArray(_)));
        assert_eq!(reg.len(), 0);
        assert!(reg.vertex_array(vao).is_none());
    }
}
