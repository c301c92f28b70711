mod access;
mod resolver;
mod session;
