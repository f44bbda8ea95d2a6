//! Schema-driven structure conversion into host layout.

use std::ffi::c_void;
use std::ptr::{self, NonNull};

use ash::vk;
use xthunk_protocol::client::ClientObject;

use super::chain::{find_next_struct, find_next_struct32};
use super::schema::{schema_for, FieldKind, StructSchema, Width};
use super::space::{AddressSpace32, Identity32};
use crate::conversion::ConversionContext;
use crate::registry::host_handle_of;

static IDENTITY: Identity32 = Identity32;

/// How client memory is read: which layout, and how its pointers resolve.
#[derive(Clone, Copy)]
pub struct ChainReader<'a> {
    width: Width,
    space: &'a dyn AddressSpace32,
}

impl ChainReader<'static> {
    /// Client memory in host layout.
    pub fn native() -> Self {
        Self {
            width: Width::NATIVE,
            space: &IDENTITY,
        }
    }
}

impl<'a> ChainReader<'a> {
    /// Client memory in 32-bit layout inside `space`.
    pub fn wow64(space: &'a dyn AddressSpace32) -> Self {
        Self {
            width: Width::W32,
            space,
        }
    }

    pub fn width(&self) -> Width {
        self.width
    }

    /// Host address of a client pointer value.
    pub fn resolve(&self, raw: u64) -> *mut u8 {
        match self.width {
            Width::W64 => raw as usize as *mut u8,
            Width::W32 => self.space.widen(raw as u32),
        }
    }

    /// Reads one client pointer stored at `at`.
    ///
    /// # Safety
    /// `at` must be readable for one client pointer.
    pub unsafe fn read_ptr(&self, at: *const u8) -> u64 {
        // SAFETY: caller guarantees readability.
        unsafe {
            match self.width {
                Width::W64 => at.cast::<u64>().read_unaligned(),
                Width::W32 => at.cast::<u32>().read_unaligned() as u64,
            }
        }
    }

    /// First structure tagged `s_type` in the client chain starting at `head`.
    ///
    /// # Safety
    /// The chain must be readable.
    pub unsafe fn find(&self, head: u64, s_type: vk::StructureType) -> Option<*mut u8> {
        // SAFETY: forwarded from caller.
        unsafe {
            match self.width {
                Width::W64 => find_next_struct(head as usize as *const c_void, s_type)
                    .map(|p| p.as_ptr().cast::<u8>()),
                Width::W32 => find_next_struct32(self.space, head as u32, s_type)
                    .map(|p| self.space.widen(p)),
            }
        }
    }
}

/// Builds host-layout copies of client structures in a
/// [`ConversionContext`].
pub struct Converter<'r, 'c> {
    reader: ChainReader<'r>,
    ctx: &'c mut ConversionContext,
}

impl<'r, 'c> Converter<'r, 'c> {
    pub fn new(reader: ChainReader<'r>, ctx: &'c mut ConversionContext) -> Self {
        Self { reader, ctx }
    }

    /// Converts the structure at client address `raw` (null stays null),
    /// including everything reachable from it.
    ///
    /// # Safety
    /// `raw` must address a readable `schema` structure in client layout.
    pub unsafe fn convert_in(&mut self, raw: u64, schema: &StructSchema) -> *const c_void {
        let src = self.reader.resolve(raw);
        if src.is_null() {
            return ptr::null();
        }
        // SAFETY: forwarded from caller.
        unsafe { self.convert_one(src, schema).cast() }
    }

    /// Converts an array of `count` structures.
    ///
    /// # Safety
    /// `raw` must address `count` readable structures in client layout.
    pub unsafe fn convert_array_in(
        &mut self,
        raw: u64,
        count: u32,
        schema: &StructSchema,
    ) -> *const c_void {
        let src = self.reader.resolve(raw);
        if src.is_null() || count == 0 {
            return ptr::null();
        }
        // SAFETY: forwarded from caller.
        unsafe { self.convert_array(src, count as usize, schema).cast() }
    }

    unsafe fn convert_one(&mut self, src: *const u8, schema: &StructSchema) -> *mut u8 {
        let dst = self.ctx.alloc(schema.layout(Width::NATIVE).size).as_ptr();
        // SAFETY: dst is fresh and large enough; src per caller.
        unsafe { self.convert_into(src, dst, schema) };
        dst
    }

    unsafe fn convert_array(&mut self, src: *const u8, count: usize, schema: &StructSchema) -> *mut u8 {
        let src_size = schema.layout(self.reader.width).size;
        let dst_size = schema.layout(Width::NATIVE).size;
        let dst = self.ctx.alloc(dst_size * count).as_ptr();
        for i in 0..count {
            // SAFETY: both arrays hold `count` elements.
            unsafe { self.convert_into(src.add(i * src_size), dst.add(i * dst_size), schema) };
        }
        dst
    }

    /// Converts the extension chain starting at client address `raw`,
    /// dropping structures the adapter does not know.
    unsafe fn convert_chain(&mut self, mut raw: u64) -> *mut u8 {
        let next_offset = self.reader.width.pointer_size();
        loop {
            let src = self.reader.resolve(raw);
            if src.is_null() {
                return ptr::null_mut();
            }
            // SAFETY: every chain link starts with sType then pNext.
            let s_type = vk::StructureType::from_raw(unsafe { src.cast::<i32>().read_unaligned() });
            if let Some(schema) = schema_for(s_type) {
                // SAFETY: the tag identifies the layout.
                return unsafe { self.convert_one(src, schema) };
            }
            tracing::trace!("skipping unknown structure {:?}", s_type);
            // SAFETY: pNext sits one pointer in.
            raw = unsafe { self.reader.read_ptr(src.add(next_offset)) };
        }
    }

    unsafe fn convert_into(&mut self, src: *const u8, dst: *mut u8, schema: &StructSchema) {
        let src_layout = schema.layout(self.reader.width);
        let dst_layout = schema.layout(Width::NATIVE);
        for (i, field) in schema.fields.iter().enumerate() {
            // SAFETY: offsets come from the schema of both structures.
            unsafe {
                let s = src.add(src_layout.offsets[i]);
                let d = dst.add(dst_layout.offsets[i]);
                match *field {
                    FieldKind::Tag | FieldKind::U32 => ptr::copy_nonoverlapping(s, d, 4),
                    FieldKind::U64 => ptr::copy_nonoverlapping(s, d, 8),
                    FieldKind::Bytes { size, .. } => ptr::copy_nonoverlapping(s, d, size),
                    FieldKind::Next => {
                        let next = self.convert_chain(self.reader.read_ptr(s));
                        write_native_ptr(d, next);
                    }
                    FieldKind::Ptr => {
                        write_native_ptr(d, self.reader.resolve(self.reader.read_ptr(s)));
                    }
                    FieldKind::StructPtr(inner) => {
                        let p = self.reader.resolve(self.reader.read_ptr(s));
                        let converted = if p.is_null() {
                            ptr::null_mut()
                        } else {
                            self.convert_one(p, inner)
                        };
                        write_native_ptr(d, converted);
                    }
                    FieldKind::StructArray { count, schema: inner } => {
                        let n = read_count(src, &src_layout.offsets, count);
                        let p = self.reader.resolve(self.reader.read_ptr(s));
                        let converted = if p.is_null() || n == 0 {
                            ptr::null_mut()
                        } else {
                            self.convert_array(p, n, inner)
                        };
                        write_native_ptr(d, converted);
                    }
                    FieldKind::PtrArray { count } => {
                        let n = read_count(src, &src_layout.offsets, count);
                        let p = self.reader.resolve(self.reader.read_ptr(s));
                        let converted = if p.is_null() || n == 0 {
                            ptr::null_mut()
                        } else {
                            let step = self.reader.width.pointer_size();
                            let out = self.ctx.alloc_array::<*mut u8>(n);
                            for j in 0..n {
                                *out.add(j) = self.reader.resolve(self.reader.read_ptr(p.add(j * step)));
                            }
                            out.cast()
                        };
                        write_native_ptr(d, converted);
                    }
                    FieldKind::DispatchableArray { count } => {
                        let n = read_count(src, &src_layout.offsets, count);
                        let p = self.reader.resolve(self.reader.read_ptr(s));
                        let converted = if p.is_null() || n == 0 {
                            ptr::null_mut()
                        } else {
                            let step = self.reader.width.pointer_size();
                            let out = self.ctx.alloc_array::<u64>(n);
                            for j in 0..n {
                                let header = self.reader.resolve(self.reader.read_ptr(p.add(j * step)));
                                *out.add(j) = match NonNull::new(header.cast::<ClientObject>()) {
                                    Some(header) => host_handle_of(header),
                                    None => 0,
                                };
                            }
                            out.cast()
                        };
                        write_native_ptr(d, converted);
                    }
                }
            }
        }
    }
}

/// Copies the scalar output fields of a converted chain back into the
/// client's structures, matching nodes by tag.
///
/// # Safety
/// `native` must be a chain produced by [`Converter::convert_in`] from the
/// client chain at `client_head`, and the client chain must be writable.
pub unsafe fn copy_chain_out(reader: ChainReader<'_>, native: *const c_void, client_head: u64) {
    let mut node = native.cast::<vk::BaseInStructure<'static>>();
    while !node.is_null() {
        // SAFETY: nodes come from the converter.
        let base = unsafe { &*node };
        if let Some(schema) = schema_for(base.s_type) {
            // SAFETY: client chain is readable and writable per caller.
            if let Some(dst) = unsafe { reader.find(client_head, base.s_type) } {
                unsafe { copy_scalars_out(reader.width(), node.cast(), dst, schema) };
            }
        }
        node = base.p_next;
    }
}

unsafe fn copy_scalars_out(width: Width, src: *const u8, dst: *mut u8, schema: &StructSchema) {
    let src_layout = schema.layout(Width::NATIVE);
    let dst_layout = schema.layout(width);
    for (i, field) in schema.fields.iter().enumerate() {
        let size = match *field {
            FieldKind::U32 => 4,
            FieldKind::U64 => 8,
            FieldKind::Bytes { size, .. } => size,
            _ => continue,
        };
        // SAFETY: offsets come from the schema of both structures.
        unsafe {
            ptr::copy_nonoverlapping(
                src.add(src_layout.offsets[i]),
                dst.add(dst_layout.offsets[i]),
                size,
            );
        }
    }
}

unsafe fn read_count(src: *const u8, offsets: &[usize], field: usize) -> usize {
    // SAFETY: count fields are U32 members of the same structure.
    unsafe { src.add(offsets[field]).cast::<u32>().read_unaligned() as usize }
}

unsafe fn write_native_ptr(dst: *mut u8, value: *mut u8) {
    // SAFETY: dst is a pointer-sized field of a native structure.
    unsafe { dst.cast::<*mut u8>().write_unaligned(value) };
}
