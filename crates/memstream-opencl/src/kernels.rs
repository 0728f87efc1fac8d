//! OpenCL C source for the four STREAM kernels.
//!
//! One source serves both precisions. The build options select the scalar
//! type (`TYPE`), the image load/store flavour (`STREAM_FP64`) and the
//! multiplier (`STREAM_SCALAR`), so a program is specialised once per
//! backend at build time.

use memstream_core::{ACCELERATOR_SCALAR, Precision};

/// Environment variable whose value is appended to the build options.
pub const EXTRA_OPTIONS_ENV: &str = "MEMSTREAM_CL_BUILD_OPTIONS";

/// Kernel program source, compiled at runtime with [`build_options`].
pub const STREAM_KERNELS: &str = r#"
#ifdef STREAM_FP64
#pragma OPENCL EXTENSION cl_khr_fp64 : enable
#define LOAD(img, pos) as_double(read_imageui(img, pos).xy)
#define STORE(img, pos, v) write_imageui(img, pos, (uint4)(as_uint2(v), 0u, 0u))
#else
#define LOAD(img, pos) read_imagef(img, pos).x
#define STORE(img, pos, v) write_imagef(img, pos, (float4)(v, 0.0f, 0.0f, 0.0f))
#endif

#define POS() ((int2)((int)get_global_id(0), (int)get_global_id(1)))

constant TYPE scalar = STREAM_SCALAR;

kernel void copy(
  read_only  image2d_t a,
  write_only image2d_t c)
{
  const int2 pos = POS();
  const TYPE _a = LOAD(a, pos);
  STORE(c, pos, _a);
}

kernel void mul(
  write_only image2d_t b,
  read_only  image2d_t c)
{
  const int2 pos = POS();
  const TYPE _c = LOAD(c, pos);
  STORE(b, pos, scalar * _c);
}

kernel void add(
  read_only  image2d_t a,
  read_only  image2d_t b,
  write_only image2d_t c)
{
  const int2 pos = POS();
  const TYPE _a = LOAD(a, pos);
  const TYPE _b = LOAD(b, pos);
  STORE(c, pos, _a + _b);
}

kernel void triad(
  write_only image2d_t a,
  read_only  image2d_t b,
  read_only  image2d_t c)
{
  const int2 pos = POS();
  const TYPE _b = LOAD(b, pos);
  const TYPE _c = LOAD(c, pos);
  STORE(a, pos, _b + scalar * _c);
}
"#;

/// Compiler options specialising [`STREAM_KERNELS`] for `precision`.
pub fn build_options(precision: Precision, extra: Option<&str>) -> String {
    let mut options = format!("-DTYPE={} -DSTREAM_SCALAR={ACCELERATOR_SCALAR:?}", precision.c_type());
    if precision == Precision::Double {
        options.push_str(" -DSTREAM_FP64");
    }
    if let Some(extra) = extra.map(str::trim).filter(|s| !s.is_empty()) {
        options.push(' ');
        options.push_str(extra);
    }
    options
}

/// Extra options from [`EXTRA_OPTIONS_ENV`], if set.
pub fn extra_build_options() -> Option<String> {
    std::env::var(EXTRA_OPTIONS_ENV).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use memstream_core::Kernel;

    #[test]
    fn every_kernel_has_an_entry_point() {
        for kernel in Kernel::ALL {
            let decl = format!("kernel void {}(", kernel.name());
            assert!(STREAM_KERNELS.contains(&decl), "missing {decl}");
        }
    }

    #[test]
    fn single_precision_options() {
        assert_eq!(build_options(Precision::Single, None), "-DTYPE=float -DSTREAM_SCALAR=0.3");
    }

    #[test]
    fn double_precision_enables_fp64_path() {
        let opts = build_options(Precision::Double, None);
        assert!(opts.starts_with("-DTYPE=double"));
        assert!(opts.contains("-DSTREAM_FP64"));
    }

    #[test]
    fn extra_options_are_appended_when_non_blank() {
        let opts = build_options(Precision::Single, Some(" -cl-mad-enable "));
        assert!(opts.ends_with(" -cl-mad-enable"));
        assert_eq!(build_options(Precision::Single, Some("   ")), build_options(Precision::Single, None));
    }

    #[test]
    fn source_gates_fp64_extension() {
        assert!(STREAM_KERNELS.contains("#ifdef STREAM_FP64"));
        assert!(STREAM_KERNELS.contains("cl_khr_fp64"));
    }
}
