use std::{
    io::{self, BufReader, Read, Seek, Write},
    mem, slice,
};

/// Raw struct IO for `#[repr(C, packed)]` headers.
pub trait BinaryData {
    fn read<R: Read + Seek>(buffer: &mut BufReader<R>) -> io::Result<Self>
    where
        Self: Sized,
    {
        let mut header = unsafe { mem::zeroed() };

        let header_size = mem::size_of::<Self>();
        unsafe {
            let header_slice =
                slice::from_raw_parts_mut(&mut header as *mut _ as *mut u8, header_size);
            // `read_exact()` comes from `Read` impl for `&[u8]`
            buffer.read_exact(header_slice)?;
        }
        Ok(header)
    }

    fn write<W: Write>(&self, out: &mut W) -> io::Result<()>
    where
        Self: Sized,
    {
        let size = mem::size_of::<Self>();
        unsafe {
            let bytes = slice::from_raw_parts(self as *const _ as *const u8, size);
            out.write_all(bytes)
        }
    }
}
