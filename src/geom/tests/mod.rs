mod test_bvh_basic;
mod test_face_basic;
mod test_triangle_basic;
