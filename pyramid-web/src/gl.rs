/// WebGL2 renderer for the pyramid scene.
///
/// Meshes are drawn with a small lit shader approximating a metallic/rough
/// standard material under one ambient and one directional light. Labels are
/// camera-facing quads textured with their painted canvases, blended after
/// the opaque pass and sorted far to near.

use nalgebra::Matrix4;
use pyramid_core::{Camera, Mesh, Scene, Sprite};
use wasm_bindgen::JsValue;
use web_sys::{
    Document, WebGl2RenderingContext as Gl, WebGlBuffer, WebGlProgram, WebGlShader, WebGlTexture,
    WebGlUniformLocation, WebGlVertexArrayObject,
};

use crate::text;

const MESH_VERTEX: &str = r#"#version 300 es
layout(location = 0) in vec3 a_position;
layout(location = 1) in vec3 a_normal;
uniform mat4 u_model;
uniform mat4 u_view_projection;
out vec3 v_normal;
out vec3 v_world;
void main() {
    vec4 world = u_model * vec4(a_position, 1.0);
    v_world = world.xyz;
    v_normal = mat3(u_model) * a_normal;
    gl_Position = u_view_projection * world;
}
"#;

const MESH_FRAGMENT: &str = r#"#version 300 es
precision highp float;
in vec3 v_normal;
in vec3 v_world;
uniform vec3 u_color;
uniform vec3 u_emissive;
uniform float u_emissive_intensity;
uniform float u_metalness;
uniform float u_roughness;
uniform vec3 u_ambient;
uniform vec3 u_light_color;
uniform vec3 u_light_dir;
uniform vec3 u_camera;
out vec4 out_color;

vec3 to_linear(vec3 c) { return pow(c, vec3(2.2)); }

void main() {
    vec3 n = normalize(v_normal);
    vec3 l = normalize(u_light_dir);
    vec3 v = normalize(u_camera - v_world);
    vec3 h = normalize(l + v);
    vec3 albedo = to_linear(u_color);

    float diffuse = max(dot(n, l), 0.0);
    float shininess = mix(128.0, 4.0, u_roughness);
    vec3 f0 = mix(vec3(0.04), albedo, u_metalness);
    vec3 specular = f0 * pow(max(dot(n, h), 0.0), shininess) * diffuse;

    vec3 lit = albedo * (1.0 - u_metalness) * (u_ambient + u_light_color * diffuse)
        + albedo * u_metalness * u_ambient
        + specular * u_light_color
        + to_linear(u_emissive) * u_emissive_intensity;
    out_color = vec4(pow(lit, vec3(1.0 / 2.2)), 1.0);
}
"#;

const SPRITE_VERTEX: &str = r#"#version 300 es
layout(location = 0) in vec2 a_corner;
uniform mat4 u_view;
uniform mat4 u_projection;
uniform vec3 u_center;
uniform vec2 u_scale;
out vec2 v_uv;
void main() {
    vec4 view = u_view * vec4(u_center, 1.0);
    view.xy += a_corner * u_scale;
    v_uv = vec2(a_corner.x + 0.5, 0.5 - a_corner.y);
    gl_Position = u_projection * view;
}
"#;

const SPRITE_FRAGMENT: &str = r#"#version 300 es
precision mediump float;
in vec2 v_uv;
uniform sampler2D u_texture;
uniform float u_opacity;
out vec4 out_color;
void main() {
    vec4 texel = texture(u_texture, v_uv);
    out_color = vec4(texel.rgb, texel.a * u_opacity);
    if (out_color.a < 0.004) discard;
}
"#;

/// Two triangles covering a unit square centered on the origin
const QUAD: [f32; 12] = [
    -0.5, -0.5, 0.5, -0.5, 0.5, 0.5, //
    -0.5, -0.5, 0.5, 0.5, -0.5, 0.5,
];

fn compile_shader(gl: &Gl, kind: u32, source: &str) -> Result<WebGlShader, JsValue> {
    let shader = gl
        .create_shader(kind)
        .ok_or_else(|| JsValue::from_str("unable to create shader"))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if gl
        .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(shader)
    } else {
        let log = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        Err(JsValue::from_str(&format!("shader compile failed: {log}")))
    }
}

fn link_program(gl: &Gl, vertex: &str, fragment: &str) -> Result<WebGlProgram, JsValue> {
    let vs = compile_shader(gl, Gl::VERTEX_SHADER, vertex)?;
    let fs = compile_shader(gl, Gl::FRAGMENT_SHADER, fragment)?;
    let program = gl
        .create_program()
        .ok_or_else(|| JsValue::from_str("unable to create program"))?;
    gl.attach_shader(&program, &vs);
    gl.attach_shader(&program, &fs);
    gl.link_program(&program);
    gl.delete_shader(Some(&vs));
    gl.delete_shader(Some(&fs));

    if gl
        .get_program_parameter(&program, Gl::LINK_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(program)
    } else {
        let log = gl.get_program_info_log(&program).unwrap_or_default();
        gl.delete_program(Some(&program));
        Err(JsValue::from_str(&format!("program link failed: {log}")))
    }
}

fn upload(gl: &Gl, data: &[f32]) -> Result<WebGlBuffer, JsValue> {
    let buffer = gl
        .create_buffer()
        .ok_or_else(|| JsValue::from_str("unable to create buffer"))?;
    gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&buffer));
    gl.buffer_data_with_u8_array(Gl::ARRAY_BUFFER, bytemuck::cast_slice(data), Gl::STATIC_DRAW);
    Ok(buffer)
}

fn vertex_array(gl: &Gl) -> Result<WebGlVertexArrayObject, JsValue> {
    gl.create_vertex_array()
        .ok_or_else(|| JsValue::from_str("unable to create vertex array"))
}

/// Interleaved position + normal, three vertices per triangle
fn interleave(mesh: &Mesh) -> Vec<f32> {
    let mut data = Vec::with_capacity(mesh.vertex_count() * 6);
    for triangle in &mesh.triangles {
        for vertex in &triangle.vertices {
            data.extend_from_slice(vertex.position.coords.as_slice());
            data.extend_from_slice(vertex.normal.as_slice());
        }
    }
    data
}

/// Back-to-front order by distance from the eye
fn sort_far_to_near(sprites: &[Sprite], view: &Matrix4<f32>) -> Vec<usize> {
    let mut order: Vec<(usize, f32)> = sprites
        .iter()
        .enumerate()
        .map(|(i, s)| (i, view.transform_point(&s.position).z))
        .collect();
    // view space looks down -Z: more negative is farther
    order.sort_by(|a, b| a.1.total_cmp(&b.1));
    order.into_iter().map(|(i, _)| i).collect()
}

struct MeshUniforms {
    model: Option<WebGlUniformLocation>,
    view_projection: Option<WebGlUniformLocation>,
    color: Option<WebGlUniformLocation>,
    emissive: Option<WebGlUniformLocation>,
    emissive_intensity: Option<WebGlUniformLocation>,
    metalness: Option<WebGlUniformLocation>,
    roughness: Option<WebGlUniformLocation>,
    ambient: Option<WebGlUniformLocation>,
    light_color: Option<WebGlUniformLocation>,
    light_dir: Option<WebGlUniformLocation>,
    camera: Option<WebGlUniformLocation>,
}

impl MeshUniforms {
    fn locate(gl: &Gl, program: &WebGlProgram) -> Self {
        let at = |name: &str| gl.get_uniform_location(program, name);
        Self {
            model: at("u_model"),
            view_projection: at("u_view_projection"),
            color: at("u_color"),
            emissive: at("u_emissive"),
            emissive_intensity: at("u_emissive_intensity"),
            metalness: at("u_metalness"),
            roughness: at("u_roughness"),
            ambient: at("u_ambient"),
            light_color: at("u_light_color"),
            light_dir: at("u_light_dir"),
            camera: at("u_camera"),
        }
    }
}

struct SpriteUniforms {
    view: Option<WebGlUniformLocation>,
    projection: Option<WebGlUniformLocation>,
    center: Option<WebGlUniformLocation>,
    scale: Option<WebGlUniformLocation>,
    opacity: Option<WebGlUniformLocation>,
    texture: Option<WebGlUniformLocation>,
}

impl SpriteUniforms {
    fn locate(gl: &Gl, program: &WebGlProgram) -> Self {
        let at = |name: &str| gl.get_uniform_location(program, name);
        Self {
            view: at("u_view"),
            projection: at("u_projection"),
            center: at("u_center"),
            scale: at("u_scale"),
            opacity: at("u_opacity"),
            texture: at("u_texture"),
        }
    }
}

struct GpuMesh {
    vao: WebGlVertexArrayObject,
    _buffer: WebGlBuffer,
    vertex_count: i32,
}

pub struct GlRenderer {
    gl: Gl,
    mesh_program: WebGlProgram,
    mesh_uniforms: MeshUniforms,
    sprite_program: WebGlProgram,
    sprite_uniforms: SpriteUniforms,
    meshes: Vec<GpuMesh>,
    textures: Vec<WebGlTexture>,
    quad: WebGlVertexArrayObject,
    _quad_buffer: WebGlBuffer,
    viewport: (i32, i32),
}

impl GlRenderer {
    /// Compile shaders and upload every mesh and label texture of `scene`.
    pub fn new(gl: Gl, document: &Document, scene: &Scene) -> Result<Self, JsValue> {
        let mesh_program = link_program(&gl, MESH_VERTEX, MESH_FRAGMENT)?;
        let sprite_program = link_program(&gl, SPRITE_VERTEX, SPRITE_FRAGMENT)?;
        let mesh_uniforms = MeshUniforms::locate(&gl, &mesh_program);
        let sprite_uniforms = SpriteUniforms::locate(&gl, &sprite_program);

        let mut meshes = Vec::with_capacity(scene.meshes.len());
        for scene_mesh in &scene.meshes {
            let data = interleave(&scene_mesh.mesh);
            let vao = vertex_array(&gl)?;
            gl.bind_vertex_array(Some(&vao));
            let buffer = upload(&gl, &data)?;
            let stride = 6 * std::mem::size_of::<f32>() as i32;
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_with_i32(0, 3, Gl::FLOAT, false, stride, 0);
            gl.enable_vertex_attrib_array(1);
            gl.vertex_attrib_pointer_with_i32(1, 3, Gl::FLOAT, false, stride, 3 * 4);
            meshes.push(GpuMesh {
                vao,
                _buffer: buffer,
                vertex_count: scene_mesh.mesh.vertex_count() as i32,
            });
        }

        let quad = vertex_array(&gl)?;
        gl.bind_vertex_array(Some(&quad));
        let quad_buffer = upload(&gl, &QUAD)?;
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_with_i32(0, 2, Gl::FLOAT, false, 0, 0);
        gl.bind_vertex_array(None);

        let mut renderer = Self {
            gl,
            mesh_program,
            mesh_uniforms,
            sprite_program,
            sprite_uniforms,
            meshes,
            textures: Vec::with_capacity(scene.labels.len()),
            quad,
            _quad_buffer: quad_buffer,
            viewport: (1, 1),
        };
        renderer.sync_labels(document, scene)?;
        log::info!(
            "gpu resources ready: {} meshes, {} label textures",
            renderer.meshes.len(),
            renderer.textures.len()
        );
        Ok(renderer)
    }

    /// Paint textures for labels added to `scene` since the last call.
    pub fn sync_labels(&mut self, document: &Document, scene: &Scene) -> Result<(), JsValue> {
        for sprite in scene.labels.iter().skip(self.textures.len()) {
            let texture = self.label_texture(document, sprite)?;
            self.textures.push(texture);
        }
        Ok(())
    }

    fn label_texture(&self, document: &Document, sprite: &Sprite) -> Result<WebGlTexture, JsValue> {
        let gl = &self.gl;
        let canvas = text::paint_label(document, sprite)?;
        let texture = gl
            .create_texture()
            .ok_or_else(|| JsValue::from_str("unable to create texture"))?;
        gl.bind_texture(Gl::TEXTURE_2D, Some(&texture));
        gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_MIN_FILTER, Gl::LINEAR as i32);
        gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_MAG_FILTER, Gl::LINEAR as i32);
        gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_WRAP_S, Gl::CLAMP_TO_EDGE as i32);
        gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_WRAP_T, Gl::CLAMP_TO_EDGE as i32);
        gl.tex_image_2d_with_u32_and_u32_and_html_canvas_element(
            Gl::TEXTURE_2D,
            0,
            Gl::RGBA as i32,
            Gl::RGBA,
            Gl::UNSIGNED_BYTE,
            &canvas,
        )?;
        gl.bind_texture(Gl::TEXTURE_2D, None);
        Ok(texture)
    }

    /// Drawing buffer size in device pixels
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width as i32, height as i32);
    }

    pub fn render(&self, scene: &Scene, camera: &Camera) {
        let gl = &self.gl;
        let [r, g, b] = scene.background.to_unit_f32();
        gl.viewport(0, 0, self.viewport.0, self.viewport.1);
        gl.clear_color(r, g, b, 1.0);
        gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);

        let view = camera.view_matrix();
        let projection = camera.projection_matrix();
        self.draw_meshes(scene, camera, &(projection * view));
        self.draw_sprites(&scene.labels, &view, &projection);
    }

    fn draw_meshes(&self, scene: &Scene, camera: &Camera, view_projection: &Matrix4<f32>) {
        let gl = &self.gl;
        let u = &self.mesh_uniforms;
        gl.enable(Gl::DEPTH_TEST);
        gl.depth_mask(true);
        gl.disable(Gl::BLEND);
        gl.enable(Gl::CULL_FACE);
        gl.use_program(Some(&self.mesh_program));

        let lights = &scene.lights;
        let ambient = lights.ambient.color.to_unit_f32().map(|c| c * lights.ambient.intensity);
        let light = lights.directional.color.to_unit_f32().map(|c| c * lights.directional.intensity);
        let dir = lights.directional.direction();
        gl.uniform_matrix4fv_with_f32_array(u.view_projection.as_ref(), false, view_projection.as_slice());
        gl.uniform3fv_with_f32_array(u.ambient.as_ref(), &ambient);
        gl.uniform3fv_with_f32_array(u.light_color.as_ref(), &light);
        gl.uniform3f(u.light_dir.as_ref(), dir.x, dir.y, dir.z);
        let eye = camera.position;
        gl.uniform3f(u.camera.as_ref(), eye.x, eye.y, eye.z);

        for (gpu, scene_mesh) in self.meshes.iter().zip(&scene.meshes) {
            let material = &scene_mesh.material;
            gl.uniform_matrix4fv_with_f32_array(
                u.model.as_ref(),
                false,
                scene_mesh.model_matrix().as_slice(),
            );
            gl.uniform3fv_with_f32_array(u.color.as_ref(), &material.color.to_unit_f32());
            gl.uniform3fv_with_f32_array(u.emissive.as_ref(), &material.emissive.to_unit_f32());
            gl.uniform1f(u.emissive_intensity.as_ref(), material.emissive_intensity);
            gl.uniform1f(u.metalness.as_ref(), material.metalness);
            gl.uniform1f(u.roughness.as_ref(), material.roughness);
            gl.bind_vertex_array(Some(&gpu.vao));
            gl.draw_arrays(Gl::TRIANGLES, 0, gpu.vertex_count);
        }
        gl.bind_vertex_array(None);
        gl.disable(Gl::CULL_FACE);
    }

    fn draw_sprites(&self, sprites: &[Sprite], view: &Matrix4<f32>, projection: &Matrix4<f32>) {
        let gl = &self.gl;
        let u = &self.sprite_uniforms;
        gl.enable(Gl::BLEND);
        gl.blend_func(Gl::SRC_ALPHA, Gl::ONE_MINUS_SRC_ALPHA);
        gl.depth_mask(false);
        gl.use_program(Some(&self.sprite_program));
        gl.uniform_matrix4fv_with_f32_array(u.view.as_ref(), false, view.as_slice());
        gl.uniform_matrix4fv_with_f32_array(u.projection.as_ref(), false, projection.as_slice());
        gl.active_texture(Gl::TEXTURE0);
        gl.uniform1i(u.texture.as_ref(), 0);
        gl.bind_vertex_array(Some(&self.quad));

        for index in sort_far_to_near(sprites, view) {
            let (Some(sprite), Some(texture)) = (sprites.get(index), self.textures.get(index)) else {
                continue;
            };
            if sprite.opacity <= 0.0 {
                continue;
            }
            if sprite.depth_test() {
                gl.enable(Gl::DEPTH_TEST);
            } else {
                gl.disable(Gl::DEPTH_TEST);
            }
            let p = sprite.position;
            gl.uniform3f(u.center.as_ref(), p.x, p.y, p.z);
            gl.uniform2f(u.scale.as_ref(), sprite.layout.scale_x, sprite.layout.scale_y);
            gl.uniform1f(u.opacity.as_ref(), sprite.opacity.clamp(0.0, 1.0));
            gl.bind_texture(Gl::TEXTURE_2D, Some(texture));
            gl.draw_arrays(Gl::TRIANGLES, 0, 6);
        }

        gl.bind_texture(Gl::TEXTURE_2D, None);
        gl.bind_vertex_array(None);
        gl.depth_mask(true);
        gl.enable(Gl::DEPTH_TEST);
        gl.disable(Gl::BLEND);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyramid_core::{default_layers, ApproxMeasure, Theme};

    #[test]
    fn test_interleave_layout() {
        let mesh = Mesh::frustum(1.0, 2.0, 1.0, 3);
        let data = interleave(&mesh);
        assert_eq!(data.len(), mesh.vertex_count() * 6);
        let first = &mesh.triangles[0].vertices[0];
        assert_eq!(data[1], first.position.y);
        assert_eq!(data[4], first.normal.y);
    }

    #[test]
    fn test_sprites_sorted_far_to_near() {
        let theme = Theme::default();
        let scene = Scene::build(&theme, &default_layers(&theme), &ApproxMeasure).unwrap();
        let camera = Camera::default();
        let view = camera.view_matrix();
        let order = sort_far_to_near(&scene.labels, &view);
        assert_eq!(order.len(), scene.labels.len());
        let depth = |i: usize| view.transform_point(&scene.labels[i].position).z;
        for pair in order.windows(2) {
            assert!(depth(pair[0]) <= depth(pair[1]));
        }
    }
}
