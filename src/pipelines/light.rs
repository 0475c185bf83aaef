use cgmath::Vector3;
use wgpu::util::DeviceExt;

/// Number of point lights the shader evaluates.
pub const MAX_POINT_LIGHTS: usize = 5;

/// A point light with distance attenuation `1 / (constant + linear * d + quadratic * d²)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vector3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    pub active: bool,
}

impl PointLight {
    pub fn attenuation(&self, distance: f32) -> f32 {
        1.0 / (self.constant + self.linear * distance + self.quadratic * distance * distance)
    }

    fn to_raw(&self) -> PointLightRaw {
        PointLightRaw {
            position: self.position.into(),
            constant: self.constant,
            ambient: self.ambient.into(),
            linear: self.linear,
            diffuse: self.diffuse.into(),
            quadratic: self.quadratic,
            specular: self.specular.into(),
            active: self.active as u32,
        }
    }
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            ambient: Vector3::new(0.0, 0.0, 0.0),
            diffuse: Vector3::new(0.0, 0.0, 0.0),
            specular: Vector3::new(0.0, 0.0, 0.0),
            constant: 1.0,
            linear: 0.0,
            quadratic: 0.0,
            active: false,
        }
    }
}

/// The fixed light set of the scene plus the global lighting switch.
///
/// With lighting disabled objects are drawn with their unlit base colour.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneLights {
    pub use_lighting: bool,
    pub point_lights: [PointLight; MAX_POINT_LIGHTS],
}

impl SceneLights {
    /// Replace the light at `index`. Indices past [`MAX_POINT_LIGHTS`] are ignored with a warning.
    pub fn set_point_light(&mut self, index: usize, light: PointLight) {
        match self.point_lights.get_mut(index) {
            Some(slot) => *slot = light,
            None => log::warn!(
                "Point light index {} out of range, only {} lights are supported",
                index,
                MAX_POINT_LIGHTS
            ),
        }
    }

    pub fn active_count(&self) -> usize {
        self.point_lights.iter().filter(|l| l.active).count()
    }

    pub fn to_uniform(&self) -> LightUniform {
        LightUniform {
            use_lighting: self.use_lighting as u32,
            _padding: [0; 3],
            lights: self.point_lights.map(|light| light.to_raw()),
        }
    }
}

// Each vec3 is followed by a scalar so every row fills a 16 byte uniform slot.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightRaw {
    position: [f32; 3],
    constant: f32,
    ambient: [f32; 3],
    linear: f32,
    diffuse: [f32; 3],
    quadratic: f32,
    specular: [f32; 3],
    active: u32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    use_lighting: u32,
    // Uniforms require 16 byte (4 float) spacing before the array starts
    _padding: [u32; 3],
    lights: [PointLightRaw; MAX_POINT_LIGHTS],
}

#[derive(Debug)]
pub struct LightResources {
    pub lights: SceneLights,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(lights: SceneLights, device: &wgpu::Device) -> Self {
        let buffer = mk_buffer(device, lights.to_uniform());
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        Self {
            lights,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Replace the light set and push it to the GPU.
    pub fn update(&mut self, lights: SceneLights, queue: &wgpu::Queue) {
        self.lights = lights;
        queue.write_buffer(
            &self.buffer,
            0,
            bytemuck::cast_slice(&[self.lights.to_uniform()]),
        );
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Uniform Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}
