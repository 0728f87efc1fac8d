//! OpenCL accelerator backend storing the arrays as 2D images.
//!
//! Construction binds to one device from the [`DeviceRegistry`], validates
//! the grid layout and device capacity, builds the precision-specialised
//! kernel program and allocates three read-write images. Every kernel and
//! transfer call blocks until the in-order queue has drained.

use std::ffi::c_void;
use std::marker::PhantomData;
use std::ptr;

use memstream_core::{
    ACCELERATOR_SCALAR, Kernel, Precision, Result, StreamBackend, StreamElement, StreamError,
    ensure_host_len,
};
use opencl3::command_queue::CommandQueue;
use opencl3::context::Context;
use opencl3::kernel::{ExecuteKernel, Kernel as ClKernel};
use opencl3::memory::{
    CL_FLOAT, CL_MEM_OBJECT_IMAGE2D, CL_MEM_READ_WRITE, CL_R, CL_RG, CL_UNSIGNED_INT32, ClMem,
    Image,
};
use opencl3::program::Program;
use opencl3::types::{CL_BLOCKING, cl_image_desc, cl_image_format, cl_mem};
use tracing::{debug, error, info};

use crate::device::OpenClPlatforms;
use crate::grid::{self, ChannelOrder, ChannelType, GridFormat, GridLayout, check_capacity};
use crate::kernels;
use crate::registry::DeviceRegistry;

/// Implementation name reported by the driver.
pub const IMPLEMENTATION: &str = "OpenCL";

/// The four entry points bound to the compiled program.
struct KernelSet {
    copy: ClKernel,
    mul: ClKernel,
    add: ClKernel,
    triad: ClKernel,
}

impl KernelSet {
    fn create(program: &Program) -> Result<Self> {
        let create = |kernel: Kernel| {
            ClKernel::create(program, kernel.name())
                .map_err(|e| StreamError::runtime("clCreateKernel", format!("{kernel}: {e}")))
        };
        Ok(Self {
            copy: create(Kernel::Copy)?,
            mul: create(Kernel::Mul)?,
            add: create(Kernel::Add)?,
            triad: create(Kernel::Triad)?,
        })
    }
}

/// STREAM backend running on one OpenCL device.
///
/// Fields drop in declaration order: kernels first, then the grids, the
/// program, the queue and finally the context.
pub struct AcceleratorBackend<T: StreamElement> {
    kernels: KernelSet,
    d_a: Image,
    d_b: Image,
    d_c: Image,
    _program: Program,
    queue: CommandQueue,
    _context: Context,
    layout: GridLayout,
    device_name: String,
    _marker: PhantomData<T>,
}

impl<T: StreamElement> AcceleratorBackend<T> {
    /// Bind to device `device_index` and prepare three `array_size`-element
    /// grids.
    ///
    /// # Errors
    ///
    /// In the order checked: [`StreamError::InvalidDevice`],
    /// [`StreamError::Runtime`] (context/queue),
    /// [`StreamError::InvalidConfiguration`] (not a perfect square, or
    /// beyond image limits), [`StreamError::UnsupportedPrecision`],
    /// [`StreamError::BuildFailure`], [`StreamError::InsufficientMemory`],
    /// then [`StreamError::Runtime`] for allocation or kernel creation.
    pub fn new(
        registry: &DeviceRegistry<OpenClPlatforms>,
        array_size: usize,
        device_index: usize,
    ) -> Result<Self> {
        let device = registry.device(device_index)?;
        let info = device.info();
        info!(device = %info.name, driver = %info.driver_version, "using OpenCL device");

        let context = Context::from_device(device.handle())
            .map_err(|e| StreamError::runtime("clCreateContext", e))?;
        let queue = CommandQueue::create_default_with_properties(&context, 0, 0)
            .map_err(|e| StreamError::runtime("clCreateCommandQueue", e))?;

        let layout = grid::validate(info, array_size, T::PRECISION)?;

        let program = build_program(&context, T::PRECISION)?;

        check_capacity(info, &layout)?;

        let d_a = create_grid(&context, &layout)?;
        let d_b = create_grid(&context, &layout)?;
        let d_c = create_grid(&context, &layout)?;
        debug!(%layout, bytes = layout.total_bytes(), "allocated grids");

        let kernels = KernelSet::create(&program)?;

        Ok(Self {
            kernels,
            d_a,
            d_b,
            d_c,
            _program: program,
            queue,
            _context: context,
            layout,
            device_name: info.name.clone(),
            _marker: PhantomData,
        })
    }

    /// Dimensions of the device-resident grids.
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Grid side length.
    pub fn image_size(&self) -> usize {
        self.layout.side
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Launch one kernel over the whole grid and wait for the queue to drain.
    fn launch(&self, kernel: Kernel) -> Result<()> {
        let (handle, args): (&ClKernel, Vec<cl_mem>) = match kernel {
            Kernel::Copy => (&self.kernels.copy, vec![self.d_a.get(), self.d_c.get()]),
            Kernel::Mul => (&self.kernels.mul, vec![self.d_b.get(), self.d_c.get()]),
            Kernel::Add => {
                (&self.kernels.add, vec![self.d_a.get(), self.d_b.get(), self.d_c.get()])
            }
            Kernel::Triad => {
                (&self.kernels.triad, vec![self.d_a.get(), self.d_b.get(), self.d_c.get()])
            }
        };
        let global = self.layout.global_work_size();

        let _event = unsafe {
            let mut exec = ExecuteKernel::new(handle);
            for arg in &args {
                exec.set_arg(arg);
            }
            exec.set_global_work_sizes(&global);
            exec.enqueue_nd_range(&self.queue)
                .map_err(|e| StreamError::runtime("clEnqueueNDRangeKernel", format!("{kernel}: {e}")))?
        };

        self.queue.finish().map_err(|e| StreamError::runtime("clFinish", e))
    }
}

impl<T: StreamElement> StreamBackend<T> for AcceleratorBackend<T> {
    fn implementation(&self) -> &'static str {
        IMPLEMENTATION
    }

    fn array_size(&self) -> usize {
        self.layout.array_size
    }

    fn scalar(&self) -> T {
        T::from_f64(ACCELERATOR_SCALAR)
    }

    fn copy(&mut self) -> Result<()> {
        self.launch(Kernel::Copy)
    }

    fn mul(&mut self) -> Result<()> {
        self.launch(Kernel::Mul)
    }

    fn add(&mut self) -> Result<()> {
        self.launch(Kernel::Add)
    }

    fn triad(&mut self) -> Result<()> {
        self.launch(Kernel::Triad)
    }

    fn write_arrays(&mut self, a: &[T], b: &[T], c: &[T]) -> Result<()> {
        let n = self.layout.array_size;
        ensure_host_len('a', n, a.len())?;
        ensure_host_len('b', n, b.len())?;
        ensure_host_len('c', n, c.len())?;

        write_grid(&self.queue, &mut self.d_a, &self.layout, a)?;
        write_grid(&self.queue, &mut self.d_b, &self.layout, b)?;
        write_grid(&self.queue, &mut self.d_c, &self.layout, c)
    }

    fn read_arrays(&mut self, a: &mut [T], b: &mut [T], c: &mut [T]) -> Result<()> {
        let n = self.layout.array_size;
        ensure_host_len('a', n, a.len())?;
        ensure_host_len('b', n, b.len())?;
        ensure_host_len('c', n, c.len())?;

        read_grid(&self.queue, &self.d_a, &self.layout, a)?;
        read_grid(&self.queue, &self.d_b, &self.layout, b)?;
        read_grid(&self.queue, &self.d_c, &self.layout, c)
    }
}

impl<T: StreamElement> Drop for AcceleratorBackend<T> {
    fn drop(&mut self) {
        debug!(device = %self.device_name, "releasing OpenCL kernels, grids and program");
    }
}

impl<T: StreamElement> std::fmt::Debug for AcceleratorBackend<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcceleratorBackend")
            .field("device", &self.device_name)
            .field("layout", &self.layout)
            .field("precision", &T::PRECISION)
            .finish()
    }
}

fn build_program(context: &Context, precision: Precision) -> Result<Program> {
    let options = kernels::build_options(precision, kernels::extra_build_options().as_deref());
    debug!(%options, "building kernel program");
    Program::create_and_build_from_source(context, kernels::STREAM_KERNELS, &options).map_err(
        |log| {
            error!("OpenCL program build failed:\n{log}");
            StreamError::BuildFailure { log }
        },
    )
}

fn cl_format(format: GridFormat) -> cl_image_format {
    cl_image_format {
        image_channel_order: match format.channel_order {
            ChannelOrder::R => CL_R,
            ChannelOrder::Rg => CL_RG,
        },
        image_channel_data_type: match format.channel_type {
            ChannelType::Float => CL_FLOAT,
            ChannelType::UnsignedInt32 => CL_UNSIGNED_INT32,
        },
    }
}

fn create_grid(context: &Context, layout: &GridLayout) -> Result<Image> {
    let format = cl_format(layout.format);
    let desc = cl_image_desc {
        image_type: CL_MEM_OBJECT_IMAGE2D,
        image_width: layout.side,
        image_height: layout.side,
        image_depth: 1,
        image_array_size: 1,
        image_row_pitch: 0,
        image_slice_pitch: 0,
        num_mip_levels: 0,
        num_samples: 0,
        buffer: ptr::null_mut(),
    };
    unsafe { Image::create(context, CL_MEM_READ_WRITE, &format, &desc, ptr::null_mut()) }.map_err(
        |e| StreamError::runtime("clCreateImage", format!("{} bytes: {e}", layout.grid_bytes())),
    )
}

fn write_grid<T: StreamElement>(
    queue: &CommandQueue,
    image: &mut Image,
    layout: &GridLayout,
    src: &[T],
) -> Result<()> {
    let origin = GridLayout::ORIGIN;
    let region = layout.region();
    unsafe {
        queue
            .enqueue_write_image(
                image,
                CL_BLOCKING,
                origin.as_ptr(),
                region.as_ptr(),
                0,
                0,
                src.as_ptr() as *mut c_void,
                &[],
            )
            .map_err(|e| StreamError::runtime("clEnqueueWriteImage", e))?;
    }
    Ok(())
}

fn read_grid<T: StreamElement>(
    queue: &CommandQueue,
    image: &Image,
    layout: &GridLayout,
    dst: &mut [T],
) -> Result<()> {
    let origin = GridLayout::ORIGIN;
    let region = layout.region();
    unsafe {
        queue
            .enqueue_read_image(
                image,
                CL_BLOCKING,
                origin.as_ptr(),
                region.as_ptr(),
                0,
                0,
                dst.as_mut_ptr().cast::<c_void>(),
                &[],
            )
            .map_err(|e| StreamError::runtime("clEnqueueReadImage", e))?;
    }
    Ok(())
}
