use crate::geom::{BBox, BoxFace, Point3, Vec3, box_faces, faces_by_area, tangent_basis};

#[test]
fn box_faces_have_centers_normals_and_areas() {
    let bounds = BBox::new(Point3::new(-1.0, -2.0, -3.0), Point3::new(1.0, 2.0, 3.0));
    let faces = box_faces(bounds);

    assert_eq!(faces[BoxFace::PosX.index()].center, Point3::new(1.0, 0.0, 0.0));
    assert_eq!(faces[BoxFace::NegY.index()].center, Point3::new(0.0, -2.0, 0.0));
    assert_eq!(faces[BoxFace::PosZ.index()].normal, Vec3::Z);
    assert!((faces[BoxFace::PosX.index()].area - 24.0).abs() < 1e-12);
    assert!((faces[BoxFace::PosY.index()].area - 12.0).abs() < 1e-12);
    assert!((faces[BoxFace::NegZ.index()].area - 8.0).abs() < 1e-12);
}

#[test]
fn faces_by_area_is_descending_and_stable() {
    let bounds = BBox::new(Point3::new(-1.0, -2.0, -3.0), Point3::new(1.0, 2.0, 3.0));
    let order = faces_by_area(&box_faces(bounds));
    assert_eq!(order, [0, 1, 2, 3, 4, 5]);

    let flat = BBox::new(Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 0.5, 1.0));
    let order = faces_by_area(&box_faces(flat));
    // Y faces (4.0) beat Z faces (2.0) beat X faces (0.5); ties keep +/- order.
    assert_eq!(order, [2, 3, 4, 5, 0, 1]);
}

#[test]
fn tangent_basis_is_orthonormal_for_every_face() {
    for face in BoxFace::ALL {
        let n = face.normal();
        let (a, b) = tangent_basis(n);
        assert!((a.length() - 1.0).abs() < 1e-12, "{}", face.label());
        assert!((b.length() - 1.0).abs() < 1e-12, "{}", face.label());
        assert!(a.dot(n).abs() < 1e-12);
        assert!(b.dot(n).abs() < 1e-12);
        assert!(a.dot(b).abs() < 1e-12);
    }
}

#[test]
fn tangent_basis_switches_reference_for_vertical_normals() {
    let (a, b) = tangent_basis(Vec3::Y);
    // Y × X = -Z, Y × (-Z) = -X.
    assert_eq!(a, Vec3::new(0.0, 0.0, -1.0));
    assert_eq!(b, Vec3::new(-1.0, 0.0, 0.0));

    let (a, _) = tangent_basis(Vec3::X);
    // X × Y = Z.
    assert_eq!(a, Vec3::Z);
}
