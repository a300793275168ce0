#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use approx::assert_abs_diff_eq;
use tracing_subscriber::EnvFilter;

use meshpolish::error::CollaboratorError;
use meshpolish::manifest::SlotMeta;
use meshpolish::math::{Point3, Vector3};
use meshpolish::operations::creation::{MakeBox, MakeUvSphere};
use meshpolish::operations::fields::{
    simulate_flow, CavityParams, FieldParams, FlowParams, GravityParams, ThicknessOrFlow, ThicknessParams,
    WearParams,
};
use meshpolish::operations::finishing::{DecayParams, FinishingParams, NoiseParams, SolidifyParams};
use meshpolish::topology::{EdgeRole, Mesh};
use meshpolish::{Pipeline, PipelineConfig, PolishError, PrebuiltShape, ShapeBuilder};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn p(x: f64, y: f64, z: f64) -> Point3 {
    Point3::new(x, y, z)
}

fn run(config: PipelineConfig, builder: &dyn ShapeBuilder) -> meshpolish::PipelineOutput {
    init_tracing();
    Pipeline::new(config).unwrap().run(builder).unwrap()
}

fn cube(size: f64) -> Mesh {
    let mut mesh = Mesh::new();
    MakeBox::new(p(0.0, 0.0, 0.0), p(size, size, size))
        .execute(&mut mesh)
        .unwrap();
    mesh
}

fn sphere(radius: f64) -> Mesh {
    let mut mesh = Mesh::new();
    MakeUvSphere::new(Point3::origin(), radius)
        .with_resolution(32, 16)
        .execute(&mut mesh)
        .unwrap();
    mesh
}

struct FailingBuilder {
    in_metadata: bool,
}

impl ShapeBuilder for FailingBuilder {
    fn build_shape(&self, _mesh: &mut Mesh) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::BuildFailed("generator crashed".into()))
    }

    fn slot_meta(&self) -> Result<BTreeMap<u8, SlotMeta>, CollaboratorError> {
        if self.in_metadata {
            Err(CollaboratorError::MetadataUnavailable("no manifest".into()))
        } else {
            Ok(BTreeMap::new())
        }
    }
}

#[test]
fn closed_cube_edges_all_become_contour() {
    let out = run(PipelineConfig::default(), &PrebuiltShape::new(cube(2.0)));
    assert_eq!(out.mesh.edge_count(), 12);
    assert!(out.mesh.edges().all(|(_, e)| e.role == EdgeRole::Contour));
    assert_eq!(out.report.classify.contour, 12);
    assert_eq!(out.report.classify.perimeter, 0);
    assert!(out.mesh.edges().all(|(_, e)| e.sharp));
}

#[test]
fn coplanar_material_boundary_and_open_rim() {
    let mut mesh = Mesh::new();
    let v: Vec<_> = [
        p(0.0, 0.0, 0.0),
        p(1.0, 0.0, 0.0),
        p(2.0, 0.0, 0.0),
        p(0.0, 1.0, 0.0),
        p(1.0, 1.0, 0.0),
        p(2.0, 1.0, 0.0),
    ]
    .into_iter()
    .map(|pt| mesh.add_vertex(pt))
    .collect();
    mesh.add_face(&[v[0], v[1], v[4], v[3]], 0).unwrap();
    mesh.add_face(&[v[1], v[2], v[5], v[4]], 2).unwrap();

    let out = run(PipelineConfig::default(), &PrebuiltShape::new(mesh));
    for (_, edge) in out.mesh.edges() {
        if edge.is_boundary() {
            assert_eq!(edge.role, EdgeRole::Perimeter);
        } else {
            assert_eq!(edge.role.index(), 2);
        }
    }
    assert_eq!(out.report.classify.material, 1);
    assert_eq!(out.report.classify.perimeter, 6);
}

#[test]
fn preset_roles_survive_the_run() {
    let mut mesh = cube(1.0);
    let ids = mesh.edge_ids();
    mesh.edge_mut(ids[0]).unwrap().role = EdgeRole::Fold;
    mesh.edge_mut(ids[1]).unwrap().role = EdgeRole::Detail;

    let out = run(PipelineConfig::default(), &PrebuiltShape::new(mesh));
    assert_eq!(out.mesh.edge(ids[0]).unwrap().role, EdgeRole::Fold);
    assert_eq!(out.mesh.edge(ids[1]).unwrap().role, EdgeRole::Detail);
    assert_eq!(out.report.classify.preserved, 2);
    // Fold maps to seam and sharp by default.
    assert!(out.mesh.edge(ids[0]).unwrap().seam);
}

#[test]
fn unit_cube_volume_ignores_winding() {
    let mut inside_out = cube(1.0);
    for face in inside_out.face_ids() {
        inside_out.flip_face(face).unwrap();
    }
    for mesh in [cube(1.0), inside_out] {
        let out = run(PipelineConfig::default(), &PrebuiltShape::new(mesh));
        assert_abs_diff_eq!(out.stats.volume, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(out.stats.surface_area, 6.0, epsilon = 1e-9);
    }
}

#[test]
fn solidified_cube_keeps_its_cavity() {
    let thickness = 0.1;
    let config = PipelineConfig {
        finishing: FinishingParams {
            solidify: Some(SolidifyParams { thickness }),
            ..FinishingParams::default()
        },
        ..PipelineConfig::default()
    };
    let out = run(config, &PrebuiltShape::new(cube(1.0)));
    assert_eq!(out.mesh.face_count(), 12);

    // Corner normals are diagonal, so the inner cube shrinks by
    // thickness / sqrt(3) on every side.
    let inner = 1.0 - 2.0 * thickness / 3f64.sqrt();
    assert_abs_diff_eq!(out.stats.volume, 1.0 - inner.powi(3), epsilon = 1e-6);

    let center = p(0.5, 0.5, 0.5);
    let mut cavity_faces = 0;
    for (id, face) in out.mesh.faces() {
        let c = out.mesh.face_centroid(id).unwrap();
        let towards_center = (center - c).dot(&face.normal) > 0.0;
        let is_inner = (c - center).abs().max() < 0.45;
        assert_eq!(towards_center, is_inner);
        cavity_faces += usize::from(is_inner);
    }
    assert_eq!(cavity_faces, 6);
}

#[test]
fn protected_vertices_do_not_move() {
    let mut mesh = Mesh::new();
    MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
        .with_slot(1)
        .execute(&mut mesh)
        .unwrap();
    MakeBox::new(p(3.0, 0.0, 0.0), p(4.0, 1.0, 1.0))
        .execute(&mut mesh)
        .unwrap();
    let frozen: Vec<Point3> = mesh
        .vertices()
        .map(|(_, v)| v.point)
        .filter(|pt| pt.x < 2.0)
        .collect();
    let builder = PrebuiltShape::new(mesh).with_slot(
        1,
        SlotMeta {
            protect: true,
            ..SlotMeta::default()
        },
    );
    let config = PipelineConfig {
        finishing: FinishingParams {
            noise: Some(NoiseParams {
                amplitude: 0.2,
                ..NoiseParams::default()
            }),
            decay: Some(DecayParams { probability: 0.5 }),
            ..FinishingParams::default()
        },
        seed: 7,
        ..PipelineConfig::default()
    };

    let out = run(config, &builder);
    assert!(out.report.finishing.skipped.is_empty());
    for pt in frozen {
        assert!(
            out.mesh.vertices().any(|(_, v)| v.point == pt && v.protection >= 1.0),
            "protected vertex {pt} moved"
        );
    }
    let slot_one = out.mesh.faces().filter(|(_, f)| f.material_slot == 1).count();
    assert_eq!(slot_one, 6);
}

#[test]
fn socket_frames_are_orthonormal() {
    let mut mesh = Mesh::new();
    let faces = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
        .execute(&mut mesh)
        .unwrap();
    // +Z and +X faces become separate marker islands.
    mesh.face_mut(faces[1]).unwrap().material_slot = 3;
    mesh.face_mut(faces[5]).unwrap().material_slot = 4;
    let builder = PrebuiltShape::new(mesh).with_slot(
        3,
        SlotMeta {
            sock: true,
            ..SlotMeta::default()
        },
    );
    let config = PipelineConfig {
        socket_slots: vec![4],
        ..PipelineConfig::default()
    };

    let out = run(config, &builder);
    assert_eq!(out.sockets.len(), 2);
    for socket in &out.sockets {
        let x: Vector3 = socket.orientation.column(0).into_owned();
        let y: Vector3 = socket.orientation.column(1).into_owned();
        let z: Vector3 = socket.orientation.column(2).into_owned();
        assert_abs_diff_eq!(z.norm(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(x.norm(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(x.dot(&y), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(x.dot(&z), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(socket.orientation.determinant(), 1.0, epsilon = 1e-9);
    }
    let top = out.sockets.iter().find(|s| s.slot_id == 3).unwrap();
    assert_abs_diff_eq!(top.orientation.column(2).into_owned(), Vector3::z(), epsilon = 1e-4);
    assert_abs_diff_eq!(top.centroid, p(0.5, 0.5, 1.0), epsilon = 1e-9);
    let side = out.sockets.iter().find(|s| s.slot_id == 4).unwrap();
    assert_abs_diff_eq!(side.orientation.column(2).into_owned(), Vector3::x(), epsilon = 1e-4);
}

#[test]
fn flow_water_never_grows() {
    let (w, h) = (6, 5);
    let heights: Vec<f64> = (0..w * h)
        .map(|i| {
            let (x, y) = ((i % w) as f64, (i / w) as f64);
            (x * 0.7).sin() + (y * 1.3).cos() * 0.5
        })
        .collect();
    let neighbours: Vec<Vec<usize>> = (0..w * h)
        .map(|i| {
            let (x, y) = (i % w, i / w);
            let mut n = Vec::new();
            if x > 0 {
                n.push(i - 1);
            }
            if x + 1 < w {
                n.push(i + 1);
            }
            if y > 0 {
                n.push(i - w);
            }
            if y + 1 < h {
                n.push(i + w);
            }
            n
        })
        .collect();
    let up = vec![1.0; w * h];
    let initial = (w * h) as f64;

    let mut previous = initial;
    for iterations in 1..8 {
        let params = FlowParams {
            iterations,
            ..FlowParams::default()
        };
        let total: f64 = simulate_flow(&params, &heights, &up, &neighbours).iter().sum();
        assert!(total <= previous + 1e-9, "{total} > {previous} at {iterations}");
        assert!(total <= initial + 1e-9);
        previous = total;
    }
}

#[test]
fn every_field_channel_is_bounded() {
    let mut fields = FieldParams {
        wear: Some(WearParams::default()),
        thickness_or_flow: Some(ThicknessOrFlow::Flow(FlowParams::default())),
        gravity: Some(GravityParams::default()),
        cavity: Some(CavityParams::default()),
    };
    for _ in 0..2 {
        let config = PipelineConfig {
            fields: fields.clone(),
            seed: 3,
            ..PipelineConfig::default()
        };
        let out = run(config, &PrebuiltShape::new(sphere(1.0)));
        for (_, corner) in out.mesh.corners() {
            assert!(corner.color.iter().all(|c| (0.0..=1.0).contains(c)));
        }
        fields.thickness_or_flow = Some(ThicknessOrFlow::Thickness(ThicknessParams::default()));
    }
}

#[test]
fn sphere_thickness_reads_near_zero_at_its_diameter() {
    let radius = 1.5;
    let config = PipelineConfig {
        fields: FieldParams {
            thickness_or_flow: Some(ThicknessOrFlow::Thickness(ThicknessParams {
                max_dist: 2.0 * radius,
                ..ThicknessParams::default()
            })),
            ..FieldParams::default()
        },
        ..PipelineConfig::default()
    };
    let out = run(config, &PrebuiltShape::new(sphere(radius)));
    for (_, corner) in out.mesh.corners() {
        assert!(corner.color[1] < 0.05, "thickness {}", corner.color[1]);
        assert_abs_diff_eq!(corner.color[0], 0.0);
    }
}

#[test]
fn runs_are_deterministic() {
    let config = PipelineConfig {
        finishing: FinishingParams {
            noise: Some(NoiseParams::default()),
            ..FinishingParams::default()
        },
        fields: FieldParams {
            wear: Some(WearParams::default()),
            gravity: Some(GravityParams::default()),
            cavity: Some(CavityParams::default()),
            ..FieldParams::default()
        },
        seed: 42,
        ..PipelineConfig::default()
    };
    let builder = PrebuiltShape::new(sphere(1.0));
    let a = run(config.clone(), &builder);
    let b = run(config, &builder);
    assert_eq!(a.report, b.report);
    let points = |m: &Mesh| m.vertices().map(|(_, v)| v.point).collect::<Vec<_>>();
    let colors = |m: &Mesh| m.corners().map(|(_, c)| c.color).collect::<Vec<_>>();
    assert_eq!(points(&a.mesh), points(&b.mesh));
    assert_eq!(colors(&a.mesh), colors(&b.mesh));
}

#[test]
fn empty_shape_short_circuits() {
    let out = run(PipelineConfig::default(), &PrebuiltShape::new(Mesh::new()));
    assert!(out.mesh.is_empty());
    assert!(out.sockets.is_empty());
    assert_abs_diff_eq!(out.stats.volume, 0.0);
    assert_abs_diff_eq!(out.stats.mass, 0.0);
}

#[test]
fn collaborator_failures_abort_the_run() {
    init_tracing();
    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
    for in_metadata in [false, true] {
        let result = pipeline.run(&FailingBuilder { in_metadata });
        assert!(matches!(result, Err(PolishError::Collaborator(_))));
    }
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let config = PipelineConfig {
        global_scale: -1.0,
        ..PipelineConfig::default()
    };
    assert!(matches!(Pipeline::new(config), Err(PolishError::Config(_))));
}
