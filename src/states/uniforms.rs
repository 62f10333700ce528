//! Named shader uniforms.

use cgmath::{Matrix2, Matrix3, Matrix4, Vector2, Vector3, Vector4};

use crate::math::Color;
use crate::utils::{FastHashMap, HashValue};

/// Uniform variable for program object. Matrices are supplied in column
/// major order, the way `cgmath` stores them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Uniform {
    I32(i32),
    IVec2([i32; 2]),
    IVec3([i32; 3]),
    IVec4([i32; 4]),
    U32(u32),
    F32(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat2([[f32; 2]; 2]),
    Mat3([[f32; 3]; 3]),
    Mat4([[f32; 4]; 4]),
    F64(f64),
    DVec2([f64; 2]),
    DVec3([f64; 3]),
    DVec4([f64; 4]),
    DMat4([[f64; 4]; 4]),
    I32Array(Vec<i32>),
    F32Array(Vec<f32>),
    Vec3Array(Vec<[f32; 3]>),
    Vec4Array(Vec<[f32; 4]>),
    Mat4Array(Vec<[[f32; 4]; 4]>),
}

impl Uniform {
    /// Number of elements of this uniform, 1 for non-array uniforms.
    pub fn count(&self) -> usize {
        match *self {
            Uniform::I32Array(ref v) => v.len(),
            Uniform::F32Array(ref v) => v.len(),
            Uniform::Vec3Array(ref v) => v.len(),
            Uniform::Vec4Array(ref v) => v.len(),
            Uniform::Mat4Array(ref v) => v.len(),
            _ => 1,
        }
    }
}

macro_rules! impl_uniform_from {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for Uniform {
            fn from(v: $ty) -> Self {
                Uniform::$variant(v.into())
            }
        }
    };
}

impl_uniform_from!(i32, I32);
impl_uniform_from!([i32; 2], IVec2);
impl_uniform_from!([i32; 3], IVec3);
impl_uniform_from!([i32; 4], IVec4);
impl_uniform_from!(u32, U32);
impl_uniform_from!(f32, F32);
impl_uniform_from!([f32; 2], Vec2);
impl_uniform_from!([f32; 3], Vec3);
impl_uniform_from!([f32; 4], Vec4);
impl_uniform_from!(Vector2<f32>, Vec2);
impl_uniform_from!(Vector3<f32>, Vec3);
impl_uniform_from!(Vector4<f32>, Vec4);
impl_uniform_from!(Color, Vec4);
impl_uniform_from!(Matrix2<f32>, Mat2);
impl_uniform_from!(Matrix3<f32>, Mat3);
impl_uniform_from!(Matrix4<f32>, Mat4);
impl_uniform_from!(f64, F64);
impl_uniform_from!([f64; 2], DVec2);
impl_uniform_from!([f64; 3], DVec3);
impl_uniform_from!([f64; 4], DVec4);
impl_uniform_from!(Vector2<f64>, DVec2);
impl_uniform_from!(Vector3<f64>, DVec3);
impl_uniform_from!(Vector4<f64>, DVec4);
impl_uniform_from!(Matrix4<f64>, DMat4);
impl_uniform_from!(Vec<i32>, I32Array);
impl_uniform_from!(Vec<f32>, F32Array);
impl_uniform_from!(Vec<[f32; 3]>, Vec3Array);
impl_uniform_from!(Vec<[f32; 4]>, Vec4Array);
impl_uniform_from!(Vec<[[f32; 4]; 4]>, Mat4Array);

/// A mapping from uniform name to value. The last write per name wins.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<(String, Uniform)>", into = "Vec<(String, Uniform)>")]
pub struct UniformSet {
    uniforms: FastHashMap<HashValue<str>, (String, Uniform)>,
}

impl UniformSet {
    pub fn new() -> Self {
        UniformSet::default()
    }

    /// Sets the uniform `name` to `value`, returns the previous value.
    pub fn set<T1, T2>(&mut self, name: T1, value: T2) -> Option<Uniform>
    where
        T1: Into<String>,
        T2: Into<Uniform>,
    {
        let name = name.into();
        let hash = HashValue::from(&name);
        self.uniforms
            .insert(hash, (name, value.into()))
            .map(|(_, v)| v)
    }

    pub fn get<T: AsRef<str>>(&self, name: T) -> Option<&Uniform> {
        self.uniforms
            .get(&HashValue::from(name.as_ref()))
            .map(|(_, v)| v)
    }

    pub fn get_mut<T: AsRef<str>>(&mut self, name: T) -> Option<&mut Uniform> {
        self.uniforms
            .get_mut(&HashValue::from(name.as_ref()))
            .map(|(_, v)| v)
    }

    /// Returns the uniform `name`, creating it with `default` if absent.
    pub fn goc<T1, T2>(&mut self, name: T1, default: T2) -> &mut Uniform
    where
        T1: Into<String>,
        T2: Into<Uniform>,
    {
        let name = name.into();
        let hash = HashValue::from(&name);
        &mut self
            .uniforms
            .entry(hash)
            .or_insert_with(|| (name, default.into()))
            .1
    }

    #[inline]
    pub fn contains<T: AsRef<str>>(&self, name: T) -> bool {
        self.uniforms.contains_key(&HashValue::from(name.as_ref()))
    }

    pub fn remove<T: AsRef<str>>(&mut self, name: T) -> Option<Uniform> {
        self.uniforms
            .remove(&HashValue::from(name.as_ref()))
            .map(|(_, v)| v)
    }

    #[inline]
    pub fn clear(&mut self) {
        self.uniforms.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.uniforms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.uniforms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Uniform)> {
        self.uniforms.values().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<Vec<(String, Uniform)>> for UniformSet {
    fn from(uniforms: Vec<(String, Uniform)>) -> Self {
        let mut set = UniformSet::new();
        for (k, v) in uniforms {
            set.set(k, v);
        }
        set
    }
}

impl Into<Vec<(String, Uniform)>> for UniformSet {
    fn into(self) -> Vec<(String, Uniform)> {
        let mut uniforms: Vec<_> = self.uniforms.into_iter().map(|(_, v)| v).collect();
        uniforms.sort_by(|lhs, rhs| lhs.0.cmp(&rhs.0));
        uniforms
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn last_write_wins() {
        let mut set = UniformSet::new();
        assert_eq!(set.set("u_Time", 1.0f32), None);
        assert_eq!(set.set("u_Time", 2.0f32), Some(Uniform::F32(1.0)));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("u_Time"), Some(&Uniform::F32(2.0)));
    }

    #[test]
    fn goc() {
        let mut set = UniformSet::new();
        *set.goc("u_Color", Color::white()) = Color::red().into();
        assert_eq!(
            set.goc("u_Color", Color::white()),
            &mut Uniform::Vec4([1.0, 0.0, 0.0, 1.0])
        );

        assert!(set.contains("u_Color"));
        assert!(set.remove("u_Color").is_some());
        assert!(set.is_empty());
    }

    #[test]
    fn conversions() {
        let m = Matrix4::<f32>::from_scale(2.0);
        match Uniform::from(m) {
            Uniform::Mat4(v) => assert_eq!(v[0][0], 2.0),
            _ => unreachable!(),
        }

        assert_eq!(Uniform::from(vec![1i32, 2, 3]).count(), 3);
        assert_eq!(Uniform::from(Vector3::new(1.0f64, 2.0, 3.0)), Uniform::DVec3([1.0, 2.0, 3.0]));
    }
}
